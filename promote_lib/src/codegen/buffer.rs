use super::value_name;
use kernel_ir::{KernelFunction, OpId, ParameterDescriptor, ScalarTy, TypeTag};
use std::collections::BTreeMap;

/// How the generated code reaches the pixels of an image parameter.
///
/// `data`, `width` and `height` are C expressions. `stride` is the number of elements per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub elem: ScalarTy,
    pub data: String,
    pub width: String,
    pub height: String,
    pub stride: u32,
}

impl BufferDescriptor {
    /// The descriptor used when a parameter has no `buffer` declaration.
    ///
    /// A struct parameter is assumed to carry its pixels and dimensions in the fields `data`,
    /// `width` and `height`. A pointer parameter is the pixel data itself, with the dimensions
    /// in scope as `width` and `height`.
    pub fn for_param(param: &ParameterDescriptor) -> Self {
        let (data, width, height) = match &param.ty {
            Some(TypeTag::Struct(_)) => (
                format!("{}.data", param.name),
                format!("{}.width", param.name),
                format!("{}.height", param.name),
            ),
            _ => (param.name.clone(), "width".to_owned(), "height".to_owned()),
        };
        Self::with_defaults(data, width, height)
    }

    /// The descriptor used when the buffer `buffer` has no `buffer` declaration.
    ///
    /// A pointer extracted from a struct reads its pixels from the extracted field, and its
    /// dimensions from the `width` and `height` fields next to it: `img.aux` gives `img.aux`,
    /// `img.width` and `img.height`.
    pub fn for_buffer(kernel: &KernelFunction, buffer: OpId) -> Self {
        if let Some(param) = kernel.param(buffer) {
            return Self::for_param(param);
        }
        match kernel.field_path(buffer) {
            Some(path) if path.len() > 1 => {
                let owner = path[..path.len() - 1].join(".");
                Self::with_defaults(
                    path.join("."),
                    format!("{owner}.width"),
                    format!("{owner}.height"),
                )
            }
            _ => Self::with_defaults(
                value_name(kernel, buffer),
                "width".to_owned(),
                "height".to_owned(),
            ),
        }
    }

    fn with_defaults(data: String, width: String, height: String) -> Self {
        Self {
            elem: ScalarTy::F32,
            data,
            width,
            height,
            stride: 1,
        }
    }
}

/// The name of `buffer` in generated identifiers, its field path joined by `_`.
pub fn buffer_key(kernel: &KernelFunction, buffer: OpId) -> String {
    match kernel.field_path(buffer) {
        Some(path) => path.join("_"),
        None => value_name(kernel, buffer),
    }
}

/// The buffer descriptors declared for the parameters and extracted pointers of one kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffers {
    declared: BTreeMap<OpId, BufferDescriptor>,
}

impl Buffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous descriptor of `id`, if there was one.
    pub fn declare(&mut self, id: OpId, buffer: BufferDescriptor) -> Option<BufferDescriptor> {
        self.declared.insert(id, buffer)
    }

    pub fn get(&self, id: OpId) -> Option<&BufferDescriptor> {
        self.declared.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpId, &BufferDescriptor)> {
        self.declared.iter().map(|(&id, buffer)| (id, buffer))
    }

    /// The descriptor of `buffer`, a pointer parameter or an extracted pointer.
    ///
    /// A declaration on `buffer` itself wins. Otherwise a declaration on the parameter it was
    /// extracted from gives the element type, dimensions and stride, but the pixels are still
    /// read from the extracted field.
    pub fn descriptor(&self, kernel: &KernelFunction, buffer: OpId) -> BufferDescriptor {
        if let Some(declared) = self.get(buffer) {
            return declared.clone();
        }
        let default = BufferDescriptor::for_buffer(kernel, buffer);
        match kernel.origin_param(buffer).and_then(|param| self.get(param.id)) {
            Some(declared) => BufferDescriptor {
                data: default.data,
                ..declared.clone()
            },
            None => default,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
