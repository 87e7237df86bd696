/// Declares the fixed set of known `ModulePrefs` attributes.
///
/// Generates the `ModuleAttributes` struct (one optional slot per attribute), a read
/// accessor per attribute returning `""` when unbound, and `SETTERS`, the table from canonical
/// attribute name to the function binding it.
macro_rules! module_attributes {
    ($($field:ident => $canonical:literal),+ $(,)?) => {
        /// The known attributes of the `ModulePrefs` block, keyed by canonical camel-case name.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct ModuleAttributes {
            $($field: Option<String>,)+
        }

        impl ModuleAttributes {
            $(
                pub fn $field(&self) -> &str {
                    self.$field.as_deref().unwrap_or_default()
                }
            )+

            /// Value of an attribute by its canonical name, if that attribute was bound.
            pub fn get(&self, canonical: &str) -> Option<&str> {
                match canonical {
                    $($canonical => self.$field.as_deref(),)+
                    _ => None,
                }
            }

            /// Bound attributes as `(canonical name, value)`, in declaration order.
            pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
                [$(($canonical, self.$field.as_deref()),)+]
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|v| (name, v)))
            }
        }

        pub(crate) const SETTERS: &[(&str, AttributeSetter)] = &[
            $(($canonical, |attrs: &mut ModuleAttributes, value: String| attrs.$field = Some(value)),)+
        ];

        /// Every canonical attribute name, in declaration order.
        pub const KNOWN_ATTRIBUTES: &[&str] = &[$($canonical,)+];
    };
}

/// Declares an upper-cased string enum with a catch-all variant.
macro_rules! upper_case_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// Any other value, upper-cased.
            Other(String),
        }

        impl $name {
            /// Parse an attribute value; empty means the default.
            pub fn parse(raw: &str) -> Self {
                let upper = raw.trim().to_uppercase();
                match upper.as_str() {
                    "" => $name::$default,
                    $($text => $name::$variant,)+
                    _ => $name::Other(upper),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}
