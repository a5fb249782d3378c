use std::io::Write;

/// Carrier threaded through every `execute` call; owns nothing, just hands
/// out the output stream that `print` and `__str__` write to.
pub struct Context<'a> {
    output: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        Self { output }
    }

    pub fn output_stream(&mut self) -> &mut dyn Write {
        &mut *self.output
    }
}
