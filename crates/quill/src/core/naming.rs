//! Operation names derived from a blueprint's type name.
//!
//! | blueprint      | get           | list            | mutations              |
//! |----------------|---------------|-----------------|------------------------|
//! | `HeroBanner`   | `herobanner`  | `herobanners`   | `createHeroBanner`, .. |
//! | `Testimonials` | `testimonials`| `testimonialses`| `deleteTestimonials`, ..|
//!
//! Pluralization is suffix-based only; there is no irregular-noun table.

use quill_api::{Blueprint, Verb};

pub fn query_name(blueprint: &Blueprint) -> String {
    blueprint.name.to_lowercase()
}

pub fn plural_list_name(blueprint: &Blueprint) -> String {
    pluralize(&query_name(blueprint))
}

/// `create<Name>`, `update<Name>`, ... with the blueprint name's case kept.
/// Query verbs have no mutation name.
pub fn mutation_name(verb: Verb, blueprint: &Blueprint) -> Option<String> {
    verb.mutation_prefix()
        .map(|prefix| format!("{}{}", prefix, blueprint.name))
}

/// Published name of `verb` for `blueprint`.
pub fn operation_name(verb: Verb, blueprint: &Blueprint) -> String {
    match verb {
        Verb::Get => query_name(blueprint),
        Verb::List => plural_list_name(blueprint),
        mutation => mutation_name(mutation, blueprint).unwrap_or_default(),
    }
}

pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        return format!("{}ies", stem);
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return format!("{}es", word);
    }
    format!("{}s", word)
}
