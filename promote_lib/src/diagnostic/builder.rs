use super::{Code, Diagnostic, Span};

pub struct DiagnosticBuilder {
    span: Span,
    additional_spans: Vec<(Span, Option<String>)>,
}

impl DiagnosticBuilder {
    pub fn new(span: impl Into<Span>) -> Self {
        Self {
            span: span.into(),
            additional_spans: Vec::new(),
        }
    }

    pub fn with_additional_span(mut self, span: impl Into<Span>, message: Option<String>) -> Self {
        self.add_additional_span(span, message);
        self
    }

    pub fn add_additional_span(&mut self, span: impl Into<Span>, message: Option<String>) {
        self.additional_spans.push((span.into(), message));
    }

    fn build_custom(self, code: Code, message: String) -> Diagnostic {
        Diagnostic {
            code,
            message,
            main_span: (self.span, None),
            additional_spans: self.additional_spans,
        }
    }

    pub fn build_syntax_error(self, unexpected: &str, expected: Vec<&str>) -> Diagnostic {
        let message = if expected.is_empty() {
            format!("unexpected token: {unexpected}")
        } else {
            let expected = expected.join(", ");
            format!("unexpected token: {unexpected}, expected one of: {expected}")
        };
        self.build_custom(Code::SyntaxError, message)
    }

    pub fn build_unknown_directive(self, directive: &str) -> Diagnostic {
        let msg = format!("unknown directive: {directive}");
        self.build_custom(Code::UnknownDirective, msg)
    }

    pub fn build_outside_kernel(self, directive: &str) -> Diagnostic {
        let msg = format!("`{directive}` must appear after a `kernel` directive");
        self.build_custom(Code::OutsideKernel, msg)
    }

    pub fn build_undefined_value(self, name: &str) -> Diagnostic {
        let msg = format!("use of undefined value `{name}`");
        self.build_custom(Code::UndefinedValue, msg)
    }

    pub fn build_duplicate_value(mut self, name: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first defined here".to_owned()));
        let msg = format!("value `{name}` is defined more than once");
        self.build_custom(Code::DuplicateValue, msg)
    }

    pub fn build_invalid_operands(self, message: String) -> Diagnostic {
        self.build_custom(Code::InvalidOperands, message)
    }

    pub fn build_unknown_param_type(self, name: &str) -> Diagnostic {
        let msg = format!(
            "type of parameter `{name}` is unknown; it will not be considered for promotion"
        );
        self.build_custom(Code::UnknownParamType, msg)
    }

    pub fn build_unknown_scalar_type(self, name: &str) -> Diagnostic {
        let msg = format!("unknown element type `{name}`, expected one of: u8, i32, f32, f64");
        self.build_custom(Code::UnknownScalarType, msg)
    }

    pub fn build_even_filter_size(self, width: u32, height: u32) -> Diagnostic {
        let msg = format!(
            "filter size {width}x{height} is not odd; the halo is rounded down to {}x{}",
            width / 2,
            height / 2
        );
        self.build_custom(Code::EvenFilterSize, msg)
    }

    pub fn build_invalid_launch_config(self, what: &str) -> Diagnostic {
        let msg = format!("invalid launch configuration: {what}");
        self.build_custom(Code::InvalidLaunchConfig, msg)
    }

    pub fn build_unmappable_access(self, name: &str) -> Diagnostic {
        let msg = format!(
            "`{name}` addresses a promoted buffer with a linear index; it keeps reading global memory"
        );
        self.build_custom(Code::UnmappableAccess, msg)
    }
}
