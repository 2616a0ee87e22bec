use crate::config::conventions::HostConventions;
use crate::domain::mirror::{AssertionKind, AssertionMirror, TypeMirror};
use crate::domain::model::Annotation;
use once_cell::sync::Lazy;
use std::collections::HashMap;

const INT_MAX: &str = "2147483647";

/// 約束名稱如何正規化
#[derive(Debug, Clone, Copy)]
enum Rule {
    Plain(AssertionKind),
    /// `value` 屬性當作下界
    Lower(AssertionKind),
    /// `value` 屬性當作上界
    Upper(AssertionKind),
    /// `inclusive=false` 時改為嚴格比較
    DecimalLower,
    DecimalUpper,
    Size,
    Digits,
    Pattern,
    Emptiness,
}

static RULES: Lazy<HashMap<&'static str, Rule>> = Lazy::new(|| {
    use AssertionKind::*;
    HashMap::from([
        ("Null", Rule::Plain(IsNull)),
        ("NotNull", Rule::Plain(IsNotNull)),
        ("AssertTrue", Rule::Plain(IsTrue)),
        ("AssertFalse", Rule::Plain(IsFalse)),
        ("Min", Rule::Lower(IsGreaterOrEqualNonDecimal)),
        ("Max", Rule::Upper(IsLessOrEqualNonDecimal)),
        ("DecimalMin", Rule::DecimalLower),
        ("DecimalMax", Rule::DecimalUpper),
        ("Negative", Rule::Plain(IsNegative)),
        ("NegativeOrZero", Rule::Plain(IsNegativeOrZero)),
        ("Positive", Rule::Plain(IsPositive)),
        ("PositiveOrZero", Rule::Plain(IsPositiveOrZero)),
        ("Size", Rule::Size),
        ("Digits", Rule::Digits),
        ("Past", Rule::Plain(IsPast)),
        ("PastOrPresent", Rule::Plain(IsPastOrPresent)),
        ("Future", Rule::Plain(IsFuture)),
        ("FutureOrPresent", Rule::Plain(IsFutureOrPresent)),
        ("Pattern", Rule::Pattern),
        ("NotEmpty", Rule::Emptiness),
        ("NotBlank", Rule::Plain(IsNotBlank)),
        ("Email", Rule::Plain(IsValidEmail)),
    ])
});

/// 把宣告式約束 metadata 正規化成封閉的 `AssertionKind` 詞彙
pub struct AssertionMirrorBuilder<'a> {
    conventions: &'a HostConventions,
}

impl<'a> AssertionMirrorBuilder<'a> {
    pub fn new(conventions: &'a HostConventions) -> Self {
        Self { conventions }
    }

    /// 約束名稱去掉已知方言前綴後的簡名
    fn simple_name<'n>(&self, annotation_name: &'n str) -> Option<&'n str> {
        self.conventions
            .constraint_dialects
            .iter()
            .find_map(|prefix| annotation_name.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.contains('.'))
    }

    fn is_char_sequence(&self, target: &TypeMirror) -> bool {
        matches!(target, TypeMirror::Scalar { name } if self.conventions.is_char_sequence(name))
    }

    /// 單一約束 → 零或一個 AssertionMirror；無法辨識的約束回傳 `None`
    pub fn build(&self, annotation: &Annotation, target: &TypeMirror) -> Option<AssertionMirror> {
        let simple = self.simple_name(&annotation.name)?;
        let rule = *RULES.get(simple)?;

        let value = annotation.text("value").map(str::to_string);
        let (kind, min, max, pattern) = match rule {
            Rule::Plain(kind) => (kind, None, None, annotation.text("regexp").map(str::to_string)),
            Rule::Lower(kind) => (kind, value, None, None),
            Rule::Upper(kind) => (kind, None, value, None),
            Rule::DecimalLower => {
                let kind = if inclusive(annotation) {
                    AssertionKind::IsGreaterOrEqual
                } else {
                    AssertionKind::IsGreaterThan
                };
                (kind, value, None, None)
            }
            Rule::DecimalUpper => {
                let kind = if inclusive(annotation) {
                    AssertionKind::IsLessOrEqual
                } else {
                    AssertionKind::IsLessThan
                };
                (kind, None, value, None)
            }
            Rule::Size => {
                let kind = if self.is_char_sequence(target) {
                    AssertionKind::HasLength
                } else {
                    AssertionKind::HasSize
                };
                let min = annotation.text("min").unwrap_or("0").to_string();
                let max = annotation.text("max").unwrap_or(INT_MAX).to_string();
                (kind, Some(min), Some(max), None)
            }
            Rule::Digits => (
                AssertionKind::HasMaxDigits,
                annotation.text("integer").map(str::to_string),
                annotation.text("fraction").map(str::to_string),
                None,
            ),
            Rule::Pattern => (
                AssertionKind::RegEx,
                None,
                None,
                annotation.text("regexp").map(str::to_string),
            ),
            Rule::Emptiness => {
                let kind = if self.is_char_sequence(target) {
                    AssertionKind::IsNotEmpty
                } else {
                    AssertionKind::IsNotEmptyIterable
                };
                (kind, None, None, None)
            }
        };

        let message = annotation
            .text("message")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{{{}.message}}", annotation.name));

        Some(AssertionMirror {
            kind,
            min,
            max,
            pattern,
            message,
        })
    }

    pub fn build_all(&self, annotations: &[Annotation], target: &TypeMirror) -> Vec<AssertionMirror> {
        annotations
            .iter()
            .filter_map(|a| self.build(a, target))
            .collect()
    }
}

fn inclusive(annotation: &Annotation) -> bool {
    annotation.text("inclusive") != Some("false")
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAKARTA: &str = "jakarta.validation.constraints.";
    const JAVAX: &str = "javax.validation.constraints.";

    fn string() -> TypeMirror {
        TypeMirror::Scalar {
            name: "java.lang.String".to_string(),
        }
    }

    fn list_of_strings() -> TypeMirror {
        TypeMirror::Container {
            container: "java.util.List".to_string(),
            element: Box::new(string()),
            element_assertions: Vec::new(),
        }
    }

    fn constraint(dialect: &str, name: &str) -> Annotation {
        Annotation::new(format!("{}{}", dialect, name))
    }

    #[test]
    fn test_both_dialects_normalize_identically() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);

        let a = builder.build(&constraint(JAKARTA, "NotNull"), &string()).unwrap();
        let b = builder.build(&constraint(JAVAX, "NotNull"), &string()).unwrap();
        assert_eq!(a.kind, AssertionKind::IsNotNull);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.message, "{jakarta.validation.constraints.NotNull.message}");
    }

    #[test]
    fn test_size_depends_on_target() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);
        let size = constraint(JAKARTA, "Size").with("max", "20");

        let on_string = builder.build(&size, &string()).unwrap();
        assert_eq!(on_string.kind, AssertionKind::HasLength);
        assert_eq!(on_string.min.as_deref(), Some("0"));
        assert_eq!(on_string.max.as_deref(), Some("20"));

        let on_list = builder.build(&size, &list_of_strings()).unwrap();
        assert_eq!(on_list.kind, AssertionKind::HasSize);
    }

    #[test]
    fn test_not_empty_depends_on_target() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);
        let not_empty = constraint(JAVAX, "NotEmpty");

        assert_eq!(
            builder.build(&not_empty, &string()).unwrap().kind,
            AssertionKind::IsNotEmpty
        );
        assert_eq!(
            builder.build(&not_empty, &list_of_strings()).unwrap().kind,
            AssertionKind::IsNotEmptyIterable
        );
    }

    #[test]
    fn test_bounds_and_exclusive_decimals() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);
        let amount = TypeMirror::Scalar {
            name: "java.math.BigDecimal".to_string(),
        };

        let min = builder
            .build(&constraint(JAKARTA, "Min").with("value", "1"), &amount)
            .unwrap();
        assert_eq!(min.kind, AssertionKind::IsGreaterOrEqualNonDecimal);
        assert_eq!(min.min.as_deref(), Some("1"));
        assert!(min.max.is_none());

        let exclusive = builder
            .build(
                &constraint(JAKARTA, "DecimalMax")
                    .with("value", "99.5")
                    .with("inclusive", "false"),
                &amount,
            )
            .unwrap();
        assert_eq!(exclusive.kind, AssertionKind::IsLessThan);
        assert_eq!(exclusive.max.as_deref(), Some("99.5"));

        let digits = builder
            .build(
                &constraint(JAKARTA, "Digits")
                    .with("integer", "6")
                    .with("fraction", "2"),
                &amount,
            )
            .unwrap();
        assert_eq!(digits.kind, AssertionKind::HasMaxDigits);
        assert_eq!(digits.min.as_deref(), Some("6"));
        assert_eq!(digits.max.as_deref(), Some("2"));
    }

    #[test]
    fn test_pattern_and_custom_message() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);
        let pattern = constraint(JAKARTA, "Pattern")
            .with("regexp", "[A-Z]{3}")
            .with("message", "must be a currency code");

        let mirror = builder.build(&pattern, &string()).unwrap();
        assert_eq!(mirror.kind, AssertionKind::RegEx);
        assert_eq!(mirror.pattern.as_deref(), Some("[A-Z]{3}"));
        assert_eq!(mirror.message, "must be a currency code");
    }

    #[test]
    fn test_unrecognized_constraints_are_ignored() {
        let conventions = HostConventions::default();
        let builder = AssertionMirrorBuilder::new(&conventions);

        assert!(builder.build(&constraint(JAKARTA, "Frobnicate"), &string()).is_none());
        assert!(builder.build(&Annotation::new("other.NotNull"), &string()).is_none());
        let all = builder.build_all(
            &[
                constraint(JAKARTA, "NotBlank"),
                Annotation::new("domain.annotations.Identity"),
                constraint(JAVAX, "Email"),
            ],
            &string(),
        );
        let kinds: Vec<AssertionKind> = all.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AssertionKind::IsNotBlank, AssertionKind::IsValidEmail]);
    }
}
