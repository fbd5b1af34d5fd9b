use analysis::{AnnotationResolver, FieldModelBuilder, RecordModel, SchemaError};
use ir::{EnumDef, RawField, RawRecord, TypeModel};
use schemagen_codegen::generators::json_codec::{
    DefaultValue, ARTIFACT_KINDS, DIRECTIVE_KINDS,
};
use schemagen_codegen::{
    CodeGenerator, CodegenError, JsonBuilderGenerator, JsonKind, JsonParserGenerator,
    StructuredEmitter,
};

fn build(
    records: Vec<RawRecord>,
    enums: Vec<EnumDef>,
    name: &str,
) -> analysis::Result<RecordModel> {
    let model = TypeModel::new(records, enums, vec![]);
    let resolver = AnnotationResolver::new("jsongen", DIRECTIVE_KINDS, ARTIFACT_KINDS);
    FieldModelBuilder::new(&model, &resolver).build(name)
}

fn emit(generator: &dyn CodeGenerator) -> String {
    let mut emitter = StructuredEmitter::default();
    generator.validate().expect("valid");
    generator.generate(&mut emitter).expect("generates");
    emitter.finish().expect("balanced")
}

fn point() -> RecordModel {
    build(
        vec![RawRecord::new(
            "point",
            vec![
                RawField::scalar("x", "gint"),
                RawField::pointer("label", "gchar"),
                RawField::scalar("__jsongen_flags_label_optional", "int"),
            ],
        )],
        vec![],
        "point",
    )
    .expect("valid record")
}

fn message() -> RecordModel {
    build(
        vec![
            RawRecord::new(
                "msg",
                vec![
                    RawField::scalar("id", "guint64"),
                    RawField::scalar("__jsongen_member_id_identifier", "int"),
                    RawField::pointer("payload", "guint8"),
                    RawField::scalar("payloadlen", "gsize"),
                    RawField::record("inner", "inner"),
                    RawField::record("meta", "meta"),
                    RawField::scalar("__jsongen_flags_meta_inline", "int"),
                    RawField::enumeration("level", "level"),
                    RawField::scalar("__jsongen_default_level_high", "int"),
                ],
            ),
            RawRecord::new("inner", vec![RawField::scalar("count", "guint32")]),
            RawRecord::new("meta", vec![RawField::scalar("ok", "gboolean")]),
        ],
        vec![EnumDef::new("level", &[("LEVEL_LOW", 0), ("LEVEL_HIGH", 1)])],
        "msg",
    )
    .expect("valid record")
}

#[test]
fn test_parser_output() {
    let parser = JsonParserGenerator::new("jsongen", &point()).expect("valid tree");
    let expected = "\
static gboolean __attribute__((unused)) __jsongen_point_from_json(struct point* point, const JsonObject* root){
\tif(json_object_has_member((JsonObject*) root, \"x\")){
\t\tpoint->x = json_object_get_int_member((JsonObject*) root, \"x\");
\t}
\telse {
\t\tgoto err;
\t}
\tif(json_object_has_member((JsonObject*) root, \"label\")){
\t\tpoint->label = json_object_get_string_member((JsonObject*) root, \"label\");
\t}
\treturn TRUE;
\terr:
\treturn FALSE;
}

";
    assert_eq!(emit(&parser), expected);
}

#[test]
fn test_builder_output() {
    let builder = JsonBuilderGenerator::new("jsongen", &point()).expect("valid tree");
    let expected = "\
static void __jsongen_point_to_json(const struct point* point, JsonBuilder* jsonbuilder){
\tjson_builder_begin_object(jsonbuilder);
\tjson_builder_set_member_name(jsonbuilder, \"x\");
\tjson_builder_add_int_value(jsonbuilder, point->x);
\tif(point->label != NULL){
\t\tjson_builder_set_member_name(jsonbuilder, \"label\");
\t\tjson_builder_add_string_value(jsonbuilder, point->label);
\t}
\tjson_builder_end_object(jsonbuilder);
}

";
    assert_eq!(emit(&builder), expected);
}

#[test]
fn test_tree_shape() {
    let parser = JsonParserGenerator::new("jsongen", &message()).expect("valid tree");
    let tree = parser.tree();
    assert_eq!(tree.json_name, None);

    let names: Vec<Option<&str>> = tree.children.iter().map(|c| c.json_name.as_deref()).collect();
    // payloadlen belongs to payload; meta is inline
    assert_eq!(
        names,
        vec![Some("identifier"), Some("payload"), Some("inner"), None, Some("level")]
    );
    assert_eq!(tree.children[1].kind, JsonKind::Base64Blob);
    assert_eq!(tree.children[2].kind, JsonKind::Object);
    assert_eq!(tree.children[3].kind, JsonKind::InlineObject);
    assert_eq!(tree.children[3].children[0].member_name(), "ok");

    let level = &tree.children[4];
    assert!(level.optional);
    assert_eq!(level.default, Some(DefaultValue::Enum { symbol: "LEVEL_HIGH".into(), value: 1 }));
}

#[test]
fn test_parser_nested_blob_enum_and_default() {
    let text = emit(&JsonParserGenerator::new("jsongen", &message()).expect("valid tree"));

    assert!(text.contains(
        "msg->id = json_object_get_int_member((JsonObject*) root, \"identifier\");"
    ));
    assert!(text.contains(
        "const gchar* payloadb64 = json_object_get_string_member((JsonObject*) root, \"payload\");"
    ));
    assert!(text.contains("msg->payload = g_base64_decode(payloadb64, &msg->payloadlen);"));

    // nested members read from the nested object
    assert!(text.contains(
        "JsonObject* obj1 = json_object_get_object_member((JsonObject*) root, \"inner\");"
    ));
    assert!(text.contains(
        "msg->inner.count = json_object_get_int_member((JsonObject*) obj1, \"count\");"
    ));

    // inline members read from the enclosing object without their own presence check
    assert!(text.contains(
        "msg->meta.ok = json_object_get_boolean_member((JsonObject*) root, \"ok\");"
    ));
    assert!(!text.contains("\"meta\""));

    assert!(text.contains("{ .str = \"HIGH\", .val = LEVEL_HIGH },"));
    assert!(text.contains("{ .str = \"high\", .val = LEVEL_HIGH },"));
    assert!(text.contains("if(!enummatched){"));
    assert!(text.contains("msg->level = LEVEL_HIGH;"));
}

#[test]
fn test_parser_rejects_malformed_base64_before_decoding() {
    let text = emit(&JsonParserGenerator::new("jsongen", &message()).expect("valid tree"));

    let fetch = text.find("const gchar* payloadb64 =").expect("blob fetch");
    let null_check = text.find("if(payloadb64 == NULL){").expect("null check");
    let decode = text.find("g_base64_decode(payloadb64").expect("decode");
    assert!(fetch < null_check && null_check < decode);

    assert!(text.contains("gsize b64len = strlen(payloadb64);"));
    assert!(text.contains("if(b64len % 4 != 0){"));
    assert!(text.contains("b64pad = b64len > 1 && payloadb64[b64len - 2] == '=' ? 2 : 1;"));
    assert!(text.contains("for(gsize i = 0; i < b64len - b64pad; i++){"));
    assert!(text.contains(
        "if(!g_ascii_isalnum(payloadb64[i]) && payloadb64[i] != '+' && payloadb64[i] != '/'){"
    ));
    assert!(text[null_check..decode].contains("goto err;"));
    assert!(text.contains("\terr:\n"));
}

#[test]
fn test_builder_nested_blob_and_enum() {
    let text = emit(&JsonBuilderGenerator::new("jsongen", &message()).expect("valid tree"));

    assert!(text.contains("gchar* payloadb64 = g_base64_encode(msg->payload, msg->payloadlen);"));
    assert!(text.contains("g_free(payloadb64);"));
    assert!(!text.contains("\"payloadlen\""));

    assert!(text.contains(concat!(
        "\tjson_builder_set_member_name(jsonbuilder, \"inner\");\n",
        "\tjson_builder_begin_object(jsonbuilder);\n"
    )));
    assert!(text.contains("json_builder_add_int_value(jsonbuilder, msg->inner.count);"));
    assert!(text.contains("json_builder_add_boolean_value(jsonbuilder, msg->meta.ok);"));

    assert!(text.contains("if(msg->level == LEVEL_LOW){"));
    assert!(text.contains("else if(msg->level == LEVEL_HIGH){"));
    assert!(text.contains("json_builder_add_null_value(jsonbuilder);"));
    assert_eq!(text.matches("json_builder_begin_object").count(), 2);
    assert_eq!(text.matches("json_builder_end_object").count(), 2);
}

#[test]
fn test_parser_without_required_members_has_no_err_label() {
    let record = build(
        vec![RawRecord::new(
            "opt",
            vec![RawField::scalar("n", "gint"), RawField::scalar("__jsongen_default_n_3", "int")],
        )],
        vec![],
        "opt",
    )
    .expect("valid record");
    let text = emit(&JsonParserGenerator::new("jsongen", &record).expect("valid tree"));
    assert!(text.contains("opt->n = 3;"));
    assert!(!text.contains("err:"));
    assert!(!text.contains("goto err"));
}

#[test]
fn test_schema_errors() {
    let blob_without_length =
        build(vec![RawRecord::new("b", vec![RawField::pointer("data", "uint8_t")])], vec![], "b")
            .expect("field model is fine");
    assert_eq!(
        JsonParserGenerator::new("jsongen", &blob_without_length).err(),
        Some(SchemaError::MissingBlobLength {
            record: "b".into(),
            field: "data".into(),
            expected: "datalen".into(),
        })
    );

    let unmapped =
        build(vec![RawRecord::new("u", vec![RawField::scalar("p", "gpointer")])], vec![], "u")
            .expect("field model is fine");
    assert!(matches!(
        JsonBuilderGenerator::new("jsongen", &unmapped),
        Err(SchemaError::UnmappedType { ref c_type, .. }) if c_type == "gpointer"
    ));

    let bad_flag = build(
        vec![RawRecord::new(
            "f",
            vec![
                RawField::scalar("n", "gint"),
                RawField::scalar("__jsongen_flags_n_inline", "int"),
            ],
        )],
        vec![],
        "f",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonParserGenerator::new("jsongen", &bad_flag),
        Err(SchemaError::InvalidFlag { .. })
    ));

    let unknown_flag = build(
        vec![RawRecord::new(
            "f",
            vec![RawField::scalar("n", "gint"), RawField::scalar("__jsongen_flags_n_loud", "int")],
        )],
        vec![],
        "f",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonParserGenerator::new("jsongen", &unknown_flag),
        Err(SchemaError::UnknownFlag { ref flag, .. }) if flag == "loud"
    ));

    let bad_member = build(
        vec![RawRecord::new(
            "m",
            vec![RawField::scalar("n", "gint"), RawField::scalar("__jsongen_member_n_a_b", "int")],
        )],
        vec![],
        "m",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonParserGenerator::new("jsongen", &bad_member),
        Err(SchemaError::MalformedDirective { .. })
    ));

    let bad_default = build(
        vec![RawRecord::new(
            "d",
            vec![RawField::pointer("s", "gchar"), RawField::scalar("__jsongen_default_s_x", "int")],
        )],
        vec![],
        "d",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonParserGenerator::new("jsongen", &bad_default),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

#[test]
fn test_codegen_error_wraps_schema_error() {
    let err: CodegenError = SchemaError::EmptyEnum("level".into()).into();
    assert_eq!(err.to_string(), "enum `level` declares no symbols");
}

#[test]
fn test_colliding_member_names_are_rejected() {
    let renamed = build(
        vec![RawRecord::new(
            "r",
            vec![
                RawField::scalar("a", "gint"),
                RawField::scalar("b", "gint"),
                RawField::scalar("__jsongen_member_b_a", "int"),
            ],
        )],
        vec![],
        "r",
    )
    .expect("field model is fine");
    assert_eq!(
        JsonParserGenerator::new("jsongen", &renamed).err(),
        Some(SchemaError::DuplicateMember { record: "r".into(), member: "a".into() })
    );

    // the spliced member lands next to the outer `ok`
    let spliced = build(
        vec![
            RawRecord::new(
                "outer",
                vec![
                    RawField::scalar("ok", "gboolean"),
                    RawField::record("meta", "meta"),
                    RawField::scalar("__jsongen_flags_meta_inline", "int"),
                ],
            ),
            RawRecord::new("meta", vec![RawField::scalar("ok", "gboolean")]),
        ],
        vec![],
        "outer",
    )
    .expect("field model is fine");
    assert_eq!(
        JsonBuilderGenerator::new("jsongen", &spliced).err(),
        Some(SchemaError::DuplicateMember { record: "outer".into(), member: "ok".into() })
    );

    // the same name in a nested object is a different namespace
    let nested = build(
        vec![
            RawRecord::new(
                "outer",
                vec![RawField::scalar("ok", "gboolean"), RawField::record("meta", "meta")],
            ),
            RawRecord::new("meta", vec![RawField::scalar("ok", "gboolean")]),
        ],
        vec![],
        "outer",
    )
    .expect("field model is fine");
    JsonParserGenerator::new("jsongen", &nested).expect("separate objects");
}

#[test]
fn test_directives_with_no_effect_are_rejected() {
    let renamed_inline = build(
        vec![
            RawRecord::new(
                "outer",
                vec![
                    RawField::record("meta", "meta"),
                    RawField::scalar("__jsongen_flags_meta_inline", "int"),
                    RawField::scalar("__jsongen_member_meta_info", "int"),
                ],
            ),
            RawRecord::new("meta", vec![RawField::scalar("flag", "gint")]),
        ],
        vec![],
        "outer",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonParserGenerator::new("jsongen", &renamed_inline),
        Err(SchemaError::MalformedDirective { ref field, .. }) if field == "meta"
    ));

    let annotated_length = build(
        vec![RawRecord::new(
            "b",
            vec![
                RawField::pointer("data", "guint8"),
                RawField::scalar("datalen", "gsize"),
                RawField::scalar("__jsongen_member_datalen_size", "int"),
            ],
        )],
        vec![],
        "b",
    )
    .expect("field model is fine");
    assert!(matches!(
        JsonBuilderGenerator::new("jsongen", &annotated_length),
        Err(SchemaError::MalformedDirective { ref field, .. }) if field == "datalen"
    ));
}
