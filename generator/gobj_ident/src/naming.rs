//! Naming rules for generated modules.
//!
//! Generated module names must be valid file and class names, and must stay
//! recognizable to the user browsing the generated directory:
//!
//! ```text
//! Game.Box`1            selector  -> Game_Box_1      (component "Scripts/Box<T>")
//! Game.Box`1 [Int32]    concrete  -> Box_Int32
//! Game.Pair`2 [A, B]    concrete  -> Pair_A_B
//! ```

use crate::TypeName;

/// Strip the namespace and the arity suffix from a full type name.
///
/// `System.Int32` becomes `Int32`, ``Game.Box`1`` becomes `Box`.
pub fn short_name_for_naming(full_name: &str) -> &str {
    let name = match full_name.rfind('.') {
        Some(dot) => &full_name[dot + 1..],
        None => full_name,
    };

    match name.find('`') {
        Some(backtick) => &name[..backtick],
        None => name,
    }
}

/// Replace every character that cannot appear in a class name with `_`.
pub fn class_friendly(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Pretty form of an open generic definition: `Box<T>`, `Pair<TKey,TValue>`.
pub fn short_name_with_brackets(generic: &TypeName, type_params: &[String]) -> String {
    format!("{}<{}>", generic.short_name(), type_params.join(","))
}

/// Pretty form of a closed type: `Box<Int32>`.
pub fn closed_display_name(generic: &TypeName, arguments: &[TypeName]) -> String {
    let arguments: Vec<&str> = arguments.iter().map(TypeName::short_name).collect();
    format!("{}<{}>", generic.short_name(), arguments.join(","))
}

/// Base name of the module generated for one instantiation.
///
/// Callers add a `_<n>` suffix when the name is already taken.
pub fn concrete_module_name(generic: &TypeName, arguments: &[TypeName]) -> String {
    let mut name = String::from(generic.short_name());
    for argument in arguments {
        name.push('_');
        name.push_str(argument.short_name());
    }
    class_friendly(&name)
}

/// Name of the selector module generated for a generic definition.
pub fn selector_module_name(generic: &TypeName) -> String {
    class_friendly(generic.full_name())
}

/// Component path under which tooling lists a selector.
pub fn selector_component_name(generic: &TypeName, type_params: &[String]) -> String {
    format!("Scripts/{}", short_name_with_brackets(generic, type_params))
}
