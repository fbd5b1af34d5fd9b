use crate::{CodeGenerator, Result, StructuredEmitter};

/// Writes `//generated by <tag> from <input>`.
pub struct HeaderGenerator {
    tag: String,
    input: String,
}

impl HeaderGenerator {
    /// Create the provenance unit for `tag` run on `input`
    pub fn new(tag: impl Into<String>, input: impl Into<String>) -> Self {
        Self { tag: tag.into(), input: input.into() }
    }
}

impl CodeGenerator for HeaderGenerator {
    fn describe(&self) -> String { "provenance header".to_string() }

    fn generate(&self, emitter: &mut StructuredEmitter) -> Result<()> {
        emitter.add_comment(&format!("generated by {} from {}", self.tag, self.input));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_line() {
        let mut emitter = StructuredEmitter::default();
        HeaderGenerator::new("jsongen", "msg.json").generate(&mut emitter).expect("writes");
        assert_eq!(emitter.finish().expect("balanced"), "//generated by jsongen from msg.json\n");
    }
}
