mod function;
mod id;
mod op;
mod outputter;
mod ty;

pub mod validator;

pub use function::{KernelBuilder, KernelFunction, ParameterDescriptor};
pub use id::OpId;
pub use op::{OpKind, OperationNode};
pub use outputter::KernelOutputter;
pub use ty::{ScalarTy, TypeTag};
pub use validator::ValidationError;
