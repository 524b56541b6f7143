//! Implicit conversions that must become explicit GLSL casts.

use super::{body, casts};

fn main_casts(stmts: &str) -> Vec<(String, &'static str)> {
    casts(&body(stmts))
}

#[test]
fn test_uint_to_bool_initialisation() {
    assert_eq!(
        main_casts("bool alive = sample(tc::uvec2(0, 0));"),
        vec![("sample(tc::uvec2(0, 0))".to_string(), "bool")]
    );
}

#[test]
fn test_unary_minus_promotes_bool() {
    assert_eq!(
        main_casts("bool alive = true;\nint sum = -alive;"),
        vec![("alive".to_string(), "int")]
    );
}

#[test]
fn test_narrowing_assignment() {
    assert_eq!(
        main_casts("int sum = 0;\nsum = sum + sample(tc::uvec2(1, 1));"),
        vec![("sum + sample(tc::uvec2(1, 1))".to_string(), "int")]
    );
}

#[test]
fn test_bool_argument_to_uint_parameter() {
    assert_eq!(
        main_casts("int sum = 2;\nstore(tc::uvec2(0, 0), (sum == 2 || sum == 3));"),
        vec![("(sum == 2 || sum == 3)".to_string(), "uint")]
    );
}

#[test]
fn test_bool_into_uint_buffer_element() {
    assert_eq!(
        main_casts("int n = 3;\ndata[0] = n > 2;"),
        vec![("n > 2".to_string(), "uint")]
    );
}

#[test]
fn test_widening_is_untouched() {
    assert!(main_casts("int a = 1;\ntc::uint b = a;\nfloat c = b;\ndouble d = c;").is_empty());
    assert!(main_casts("tc::uint u = 4u;\nbool lt = u < WIDTH;").is_empty());
}

#[test]
fn test_conditions_convert_to_bool() {
    assert_eq!(
        main_casts("int n = 1;\nif (n) { n = 0; }\nwhile (n) {}\nbool b = !n;"),
        vec![
            ("n".to_string(), "bool"),
            ("n".to_string(), "bool"),
            ("n".to_string(), "bool"),
        ]
    );
}

#[test]
fn test_logical_operands_convert_to_bool() {
    assert_eq!(
        main_casts("int a = 1;\nbool b = true;\nbool c = a && b;"),
        vec![("a".to_string(), "bool")]
    );
}

#[test]
fn test_return_narrowing() {
    let source = "struct K {\n\
                  int half(float x) { return x / 2.0f; }\n\
                  void main() {}\n\
                  };";
    assert_eq!(
        casts(source),
        vec![("x / 2.0f".to_string(), "int")]
    );
}

#[test]
fn test_double_literal_into_float() {
    assert_eq!(
        main_casts("float f = 0.5;"),
        vec![("0.5".to_string(), "float")]
    );
}

#[test]
fn test_compound_assignment_narrowing() {
    assert_eq!(
        main_casts("int acc = 0;\ntc::uint step = 2u;\nacc += step;"),
        vec![("step".to_string(), "int")]
    );
}

#[test]
fn test_unknown_types_untouched() {
    assert!(main_casts("auto x = mystery();\nint y = x;").is_empty());
}

#[test]
fn test_vector_conversions_untouched() {
    assert!(main_casts("tc::ivec2 a = tc::ivec2(1, 2);\ntc::vec2 b = tc::vec2(a);").is_empty());
}
