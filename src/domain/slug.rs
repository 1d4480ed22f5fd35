//! Slug helpers for section types and descriptive submission keys.

/// Section type used when a title has nothing to derive a slug from.
pub const CUSTOM_SECTION_TYPE: &str = "custom";

const SECTION_TYPE_SUFFIX: &str = "identifier";

/// Lowercase `input`, collapse every run of non-alphanumeric characters into a
/// single `separator` and trim separators from both ends.
pub fn slugify_with(input: &str, separator: char) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(separator);
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Underscore slug used for descriptive response keys: `"About Us"` -> `about_us`.
pub fn slugify(input: &str) -> String {
    slugify_with(input, '_')
}

/// Derive a section's `type` from its title.
///
/// `"Contact Info!!"` becomes `"contact-info-identifier"`; a blank title (or one
/// with no alphanumeric characters) becomes [`CUSTOM_SECTION_TYPE`].
pub fn section_type(title: &str) -> String {
    let base = slugify_with(title, '-');
    if base.is_empty() {
        CUSTOM_SECTION_TYPE.to_string()
    } else {
        format!("{base}-{SECTION_TYPE_SUFFIX}")
    }
}

/// Externally stable key for a field's answer: `section_field`.
pub fn descriptive_key(section_title: &str, field_label: &str) -> String {
    format!("{}_{}", slugify(section_title), slugify(field_label))
}
