#[cfg(test)]
mod test;

use crate::{KernelFunction, OpId, OpKind};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("operand {operand} of {op} does not exist in this kernel")]
    UnknownOperand { op: OpId, operand: OpId },
    #[error("operand {operand} of {op} is used before it is defined")]
    UseBeforeDef { op: OpId, operand: OpId },
    #[error("`{mnemonic}` {op} takes {min}..={max} operands, found {found}")]
    Arity {
        op: OpId,
        mnemonic: String,
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("`{mnemonic}` {op} must produce a value")]
    MissingResult { op: OpId, mnemonic: String },
    #[error("`store` {op} can't produce a value")]
    UnexpectedResult { op: OpId },
    #[error("parameter {op} can't be scheduled as an operation")]
    ScheduledParam { op: OpId },
    #[error("{op} is scheduled more than once")]
    ScheduledTwice { op: OpId },
}

/// Checks that every operand is defined before it is used, that operand counts match the kind of
/// each operation, and that only the right operations produce values.
pub fn validate(function: &KernelFunction) -> Result<(), ValidationError> {
    let mut defined: HashSet<OpId> = function.params().iter().map(|p| p.id).collect();

    for &id in function.schedule() {
        let op = &function[id];

        let (min, max) = op.kind().arity();
        let found = op.operands().len();
        if found < min || found > max {
            return Err(ValidationError::Arity {
                op: id,
                mnemonic: op.kind().mnemonic().to_owned(),
                min,
                max,
                found,
            });
        }

        for &operand in op.operands() {
            if function.get(operand).is_none() {
                return Err(ValidationError::UnknownOperand { op: id, operand });
            }
            if !defined.contains(&operand) {
                return Err(ValidationError::UseBeforeDef { op: id, operand });
            }
        }

        match op.kind() {
            OpKind::Param => return Err(ValidationError::ScheduledParam { op: id }),
            OpKind::Store if op.ty().is_some() => {
                return Err(ValidationError::UnexpectedResult { op: id })
            }
            OpKind::StructExtract { .. }
            | OpKind::Reinterpret
            | OpKind::AddressCompute
            | OpKind::Load
                if op.ty().is_none() =>
            {
                return Err(ValidationError::MissingResult {
                    op: id,
                    mnemonic: op.kind().mnemonic().to_owned(),
                })
            }
            _ => {}
        }

        if !defined.insert(id) {
            return Err(ValidationError::ScheduledTwice { op: id });
        }
    }

    Ok(())
}
