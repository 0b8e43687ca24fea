use std::fmt::{Arguments, Result, Write};

const INDENT: &str = "    ";

/// Writes C-like source code line by line, keeping track of the brace depth.
pub struct CodeWriter<'w, W: Write> {
    writer: &'w mut W,
    depth: usize,
}

impl<'w, W: Write> CodeWriter<'w, W> {
    pub fn new(writer: &'w mut W) -> Self {
        Self { writer, depth: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn line(&mut self, args: Arguments<'_>) -> Result {
        for _ in 0..self.depth {
            self.writer.write_str(INDENT)?;
        }
        self.writer.write_fmt(args)?;
        self.writer.write_char('\n')
    }

    /// Writes `args {` and indents the following lines.
    pub fn open(&mut self, args: Arguments<'_>) -> Result {
        for _ in 0..self.depth {
            self.writer.write_str(INDENT)?;
        }
        self.writer.write_fmt(args)?;
        self.writer.write_str(" {\n")?;
        self.depth += 1;
        Ok(())
    }

    /// Writes `} else {` at the depth of the matching `open`.
    pub fn reopen_else(&mut self) -> Result {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("}} else {{"))?;
        self.depth += 1;
        Ok(())
    }

    pub fn close(&mut self) -> Result {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("}}"))
    }
}
