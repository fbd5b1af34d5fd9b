use analysis::RecordModel;

use super::{blob_length_name, EnumMapping, JsonField, JsonKind};
use crate::utils::{c_string, member_access};
use crate::{CodeGenerator, FunctionSignature, Result, StructuredEmitter};

/// Emits `__<tag>_<record>_to_json`, which appends a record to a `JsonBuilder`.
pub struct JsonBuilderGenerator {
    tag: String,
    record: String,
    root: JsonField,
}

impl JsonBuilderGenerator {
    /// Prepare the builder for `record`
    pub fn new(tag: &str, record: &RecordModel) -> analysis::Result<Self> {
        Ok(Self {
            tag: tag.to_string(),
            record: record.name.clone(),
            root: JsonField::from_record(record)?,
        })
    }

    /// The JSON view the builder writes
    pub fn tree(&self) -> &JsonField { &self.root }

    /// Name of the generated function
    pub fn function_name(&self) -> String { format!("__{}_{}_to_json", self.tag, self.record) }
}

impl CodeGenerator for JsonBuilderGenerator {
    fn describe(&self) -> String { format!("builder for {}", self.record) }

    fn generate(&self, emitter: &mut StructuredEmitter) -> Result<()> {
        let signature = FunctionSignature::new(self.function_name(), "void")
            .with_static()
            .arg(&self.record, format!("const struct {}*", self.record))
            .arg("jsonbuilder", "JsonBuilder*");

        emitter.start_function(&signature)?;
        let mut writer = BuilderWriter { record: &self.record, emitter: &mut *emitter };
        writer.object(&self.root.children, &[])?;
        emitter.end_function()?;
        emitter.add_blank_line();
        Ok(())
    }
}

struct BuilderWriter<'a> {
    record: &'a str,
    emitter: &'a mut StructuredEmitter,
}

impl BuilderWriter<'_> {
    fn call(&mut self, function: &str, args: &str) {
        self.emitter.add_statement(&format!("json_builder_{}(jsonbuilder{})", function, args));
    }

    fn object(&mut self, fields: &[JsonField], path: &[String]) -> Result<()> {
        self.call("begin_object", "");
        self.members(fields, path)?;
        self.call("end_object", "");
        Ok(())
    }

    fn members(&mut self, fields: &[JsonField], path: &[String]) -> Result<()> {
        for field in fields {
            self.member(field, path)?;
        }
        Ok(())
    }

    fn member(&mut self, field: &JsonField, path: &[String]) -> Result<()> {
        if field.kind == JsonKind::InlineObject {
            let mut inner = path.to_vec();
            inner.push(field.c_name().to_string());
            return self.members(&field.children, &inner);
        }

        let pointer = matches!(field.kind, JsonKind::String | JsonKind::Base64Blob);
        let guarded = field.optional && pointer;
        if guarded {
            let source = member_access(self.record, path, field.c_name());
            self.emitter.start_condition(&format!("{} != NULL", source));
        }
        self.call("set_member_name", &format!(", {}", c_string(field.member_name())));
        self.value(field, path)?;
        if guarded {
            self.emitter.end_condition()?;
        }
        Ok(())
    }

    fn value(&mut self, field: &JsonField, path: &[String]) -> Result<()> {
        let source = member_access(self.record, path, field.c_name());
        match &field.kind {
            JsonKind::Int => self.call("add_int_value", &format!(", {}", source)),
            JsonKind::Double => self.call("add_double_value", &format!(", {}", source)),
            JsonKind::Boolean => self.call("add_boolean_value", &format!(", {}", source)),
            JsonKind::String => self.call("add_string_value", &format!(", {}", source)),
            JsonKind::Object | JsonKind::InlineObject => {
                let mut inner = path.to_vec();
                inner.push(field.c_name().to_string());
                self.object(&field.children, &inner)?;
            }
            JsonKind::Base64Blob => {
                self.emitter.start_scope(None);
                self.emitter.add_statement(&format!(
                    "gchar* payloadb64 = g_base64_encode({}, {})",
                    source,
                    blob_length_name(&source)
                ));
                self.call("add_string_value", ", payloadb64");
                self.emitter.add_statement("g_free(payloadb64)");
                self.emitter.end_scope(false)?;
            }
            JsonKind::Enum(mapping) => self.enumeration(mapping, &source)?,
        }
        Ok(())
    }

    fn enumeration(&mut self, mapping: &EnumMapping, source: &str) -> Result<()> {
        for (i, entry) in mapping.entries.iter().enumerate() {
            let condition = format!("{} == {}", source, entry.symbol);
            if i == 0 {
                self.emitter.start_condition(&condition);
            } else {
                self.emitter.start_or_alternative(&condition)?;
            }
            self.call("add_string_value", &format!(", {}", c_string(&entry.name)));
        }
        self.emitter.add_else()?;
        self.call("add_null_value", "");
        self.emitter.end_condition()?;
        Ok(())
    }
}
