use analysis::RecordModel;

use super::{blob_length_name, EnumMapping, JsonField, JsonKind};
use crate::utils::{c_string, member_access};
use crate::{CodeGenerator, FunctionSignature, Result, StructuredEmitter};

/// Emits `__<tag>_<record>_from_json`, which fills a record from a `JsonObject`.
pub struct JsonParserGenerator {
    tag: String,
    record: String,
    root: JsonField,
}

impl JsonParserGenerator {
    /// Prepare the parser for `record`
    pub fn new(tag: &str, record: &RecordModel) -> analysis::Result<Self> {
        Ok(Self {
            tag: tag.to_string(),
            record: record.name.clone(),
            root: JsonField::from_record(record)?,
        })
    }

    /// The JSON view the parser reads
    pub fn tree(&self) -> &JsonField { &self.root }

    /// Name of the generated function
    pub fn function_name(&self) -> String { format!("__{}_{}_from_json", self.tag, self.record) }
}

impl CodeGenerator for JsonParserGenerator {
    fn describe(&self) -> String { format!("parser for {}", self.record) }

    fn generate(&self, emitter: &mut StructuredEmitter) -> Result<()> {
        let signature = FunctionSignature::new(self.function_name(), "gboolean")
            .with_static()
            .attribute("__attribute__((unused))")
            .arg(&self.record, format!("struct {}*", self.record))
            .arg("root", "const JsonObject*");

        emitter.start_function(&signature)?;
        let mut writer =
            ParserWriter { record: &self.record, emitter: &mut *emitter, jumps_to_err: false };
        writer.members(&self.root.children, "root", &[], 0)?;
        let jumps_to_err = writer.jumps_to_err;

        emitter.add_statement("return TRUE");
        if jumps_to_err {
            emitter.add_label("err");
            emitter.add_statement("return FALSE");
        }
        emitter.end_function()?;
        emitter.add_blank_line();
        Ok(())
    }
}

struct ParserWriter<'a> {
    record: &'a str,
    emitter: &'a mut StructuredEmitter,
    jumps_to_err: bool,
}

impl ParserWriter<'_> {
    fn members(
        &mut self,
        fields: &[JsonField],
        object: &str,
        path: &[String],
        depth: usize,
    ) -> Result<()> {
        for field in fields {
            self.member(field, object, path, depth)?;
        }
        Ok(())
    }

    fn member(
        &mut self,
        field: &JsonField,
        object: &str,
        path: &[String],
        depth: usize,
    ) -> Result<()> {
        if field.kind == JsonKind::InlineObject {
            let inner = extend(path, field.c_name());
            return self.members(&field.children, object, &inner, depth);
        }

        self.emitter.start_condition(&format!(
            "json_object_has_member((JsonObject*) {}, {})",
            object,
            c_string(field.member_name())
        ));
        self.value(field, object, path, depth)?;
        if let Some(default) = &field.default {
            self.emitter.add_else()?;
            let target = member_access(self.record, path, field.c_name());
            self.emitter.add_statement(&format!("{} = {}", target, default.c_literal()));
        } else if !field.optional {
            self.emitter.add_else()?;
            self.goto_err();
        }
        self.emitter.end_condition()?;
        Ok(())
    }

    fn value(
        &mut self,
        field: &JsonField,
        object: &str,
        path: &[String],
        depth: usize,
    ) -> Result<()> {
        let target = member_access(self.record, path, field.c_name());
        let name = c_string(field.member_name());
        let getter = |accessor: &str| {
            format!(
                "{} = json_object_get_{}_member((JsonObject*) {}, {})",
                target, accessor, object, name
            )
        };

        match &field.kind {
            JsonKind::Int => self.emitter.add_statement(&getter("int")),
            JsonKind::Double => self.emitter.add_statement(&getter("double")),
            JsonKind::Boolean => self.emitter.add_statement(&getter("boolean")),
            JsonKind::String => self.emitter.add_statement(&getter("string")),
            JsonKind::Object => {
                let nested = format!("obj{}", depth + 1);
                self.emitter.add_statement(&format!(
                    "JsonObject* {} = json_object_get_object_member((JsonObject*) {}, {})",
                    nested, object, name
                ));
                let inner = extend(path, field.c_name());
                self.members(&field.children, &nested, &inner, depth + 1)?;
            }
            JsonKind::InlineObject => {
                let inner = extend(path, field.c_name());
                self.members(&field.children, object, &inner, depth)?;
            }
            JsonKind::Base64Blob => {
                self.emitter.start_scope(None);
                self.emitter.add_statement(&format!(
                    "const gchar* payloadb64 = json_object_get_string_member((JsonObject*) {}, {})",
                    object, name
                ));
                self.base64_check("payloadb64")?;
                self.emitter.add_statement(&format!(
                    "{} = g_base64_decode(payloadb64, &{})",
                    target,
                    blob_length_name(&target)
                ));
                self.emitter.end_scope(false)?;
            }
            JsonKind::Enum(mapping) => self.enumeration(mapping, &target, object, &name)?,
        }
        Ok(())
    }

    /// Jump to `err` unless `text` is padded standard base64; g_base64_decode skips bad input
    fn base64_check(&mut self, text: &str) -> Result<()> {
        self.emitter.start_condition(&format!("{} == NULL", text));
        self.goto_err();
        self.emitter.end_condition()?;

        self.emitter.add_statement(&format!("gsize b64len = strlen({})", text));
        self.emitter.add_statement("gsize b64pad = 0");
        self.emitter.start_condition("b64len % 4 != 0");
        self.goto_err();
        self.emitter.end_condition()?;

        self.emitter.start_condition(&format!("b64len > 0 && {}[b64len - 1] == '='", text));
        self.emitter.add_statement(&format!(
            "b64pad = b64len > 1 && {}[b64len - 2] == '=' ? 2 : 1",
            text
        ));
        self.emitter.end_condition()?;

        self.emitter.start_scope(Some("for(gsize i = 0; i < b64len - b64pad; i++)"));
        self.emitter.start_condition(&format!(
            "!g_ascii_isalnum({t}[i]) && {t}[i] != '+' && {t}[i] != '/'",
            t = text
        ));
        self.goto_err();
        self.emitter.end_condition()?;
        self.emitter.end_scope(false)?;
        Ok(())
    }

    fn enumeration(
        &mut self,
        mapping: &EnumMapping,
        target: &str,
        object: &str,
        name: &str,
    ) -> Result<()> {
        let e = &mut *self.emitter;
        e.start_scope(None);

        e.start_scope(Some("struct mapping "));
        e.add_statement("const gchar* str");
        e.add_statement(&format!("enum {} val", mapping.enum_name));
        e.end_scope(true)?;

        e.start_scope(Some("const struct mapping map[] = "));
        e.add_items(mapping.entries.iter().flat_map(|entry| {
            [entry.name.clone(), entry.name.to_lowercase()].map(|text| {
                format!("{{ .str = {}, .val = {} }}", c_string(&text), entry.symbol)
            })
        }));
        e.end_scope(true)?;

        e.add_statement(&format!(
            "const gchar* enumtmp = json_object_get_string_member((JsonObject*) {}, {})",
            object, name
        ));
        e.add_statement("gboolean enummatched = FALSE");
        e.start_scope(Some("for(int i = 0; i < G_N_ELEMENTS(map); i++)"));
        e.start_condition("enumtmp != NULL && strcmp(enumtmp, map[i].str) == 0");
        e.add_statement(&format!("{} = map[i].val", target));
        e.add_statement("enummatched = TRUE");
        e.add_break();
        e.end_condition()?;
        e.end_scope(false)?;

        e.start_condition("!enummatched");
        self.goto_err();
        self.emitter.end_condition()?;

        self.emitter.end_scope(false)?;
        Ok(())
    }

    fn goto_err(&mut self) {
        self.emitter.add_statement("goto err");
        self.jumps_to_err = true;
    }
}

fn extend(path: &[String], field: &str) -> Vec<String> {
    let mut inner = path.to_vec();
    inner.push(field.to_string());
    inner
}
