use super::*;

#[test]
fn form_method_parse_is_case_insensitive() {
    assert_eq!(FormMethod::parse("post"), Some(FormMethod::Post));
    assert_eq!(FormMethod::parse("POST"), Some(FormMethod::Post));
    assert_eq!(FormMethod::parse("Get"), Some(FormMethod::Get));
    assert_eq!(FormMethod::parse("put"), None);
}

#[test]
fn empty_method_attribute_defaults_to_get() {
    assert_eq!(FormMethod::parse(""), Some(FormMethod::Get));
}

#[test]
fn serialized_fields_preserve_document_order() {
    let form = WordForm {
        action: "/word".to_string(),
        method: FormMethod::Post,
        fields: vec![
            FormField::new("name", "casa"),
            FormField::new("content", "house"),
            FormField::new("known", "known"),
        ],
    };

    assert_eq!(
        form.serialized_fields(),
        vec![
            ("name".to_string(), "casa".to_string()),
            ("content".to_string(), "house".to_string()),
            ("known".to_string(), "known".to_string()),
        ]
    );
}

#[test]
fn field_lookup_finds_first_match() {
    let form = WordForm {
        action: "/word".to_string(),
        method: FormMethod::Post,
        fields: vec![
            FormField::new("name", "casa"),
            FormField::new("name", "shadowed"),
        ],
    };

    assert_eq!(form.field("name"), Some("casa"));
    assert_eq!(form.field("missing"), None);
}
