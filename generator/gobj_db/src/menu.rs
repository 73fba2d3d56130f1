//! Asset menu entries compiled into the generated menu items module.

use gobj_ident::TypeName;

/// A "create asset" menu entry declared on a generic definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct MenuItem {
    pub file_name: String,
    pub menu_name: String,
    pub order: i32,
    pub generic: TypeName,
}
