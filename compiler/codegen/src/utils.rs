// codegen/src/utils.rs

/// Quote `value` as a C string literal
pub fn c_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Join a member-access path and a field name with `.` (`inner.count`)
pub fn flatten_path(path: &[String], field: &str) -> String {
    let mut parts: Vec<&str> = path.iter().map(String::as_str).collect();
    parts.push(field);
    parts.join(".")
}

/// `<record>-><path.field>`
pub fn member_access(record: &str, path: &[String], field: &str) -> String {
    format!("{}->{}", record, flatten_path(path, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string() {
        assert_eq!(c_string("id"), "\"id\"");
        assert_eq!(c_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_paths() {
        assert_eq!(flatten_path(&[], "id"), "id");
        let path = vec!["inner".to_string(), "deep".to_string()];
        assert_eq!(flatten_path(&path, "count"), "inner.deep.count");
        assert_eq!(member_access("msg", &path, "count"), "msg->inner.deep.count");
    }
}
