//! `${ENV_VAR}` substitution in raw configuration text.

/// Replace `${NAME}` placeholders with the value of the named environment
/// variable.
///
/// Placeholders that do not resolve are left as-is, as are empty or
/// unterminated ones.
#[must_use]
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

/// Implementation of [`substitute_env`] with an injectable lookup, so tests
/// do not have to mutate the process environment.
fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('}') {
            Some(end) if end > 0 => {
                let name = &tail[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &tail[end + 1..];
            },
            _ => {
                // Empty or unterminated placeholder: emit literally.
                out.push_str("${");
                rest = tail;
            },
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TRELLIS_TEST_VAR" => Some("hello".to_string()),
            "TRELLIS_OTHER" => Some("world".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("key = \"${TRELLIS_TEST_VAR}\"", lookup),
            "key = \"hello\""
        );
    }

    #[test]
    fn substitutes_multiple_placeholders() {
        assert_eq!(
            substitute_with("${TRELLIS_TEST_VAR} ${TRELLIS_OTHER}", lookup),
            "hello world"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("${TRELLIS_NOT_SET_XYZ}", lookup),
            "${TRELLIS_NOT_SET_XYZ}"
        );
    }

    #[test]
    fn leaves_empty_and_unterminated_placeholders() {
        assert_eq!(substitute_with("a ${} b", lookup), "a ${} b");
        assert_eq!(substitute_with("a ${TRELLIS", lookup), "a ${TRELLIS");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
