//! The `inspect` command: print a database as a tree.

use std::fmt::Write as _;

use gobj_db::GenerationDatabase;
use gobj_ident::naming::closed_display_name;

use super::load_existing;

pub fn inspect_database(path: &str) {
    let (_, db) = load_existing(path);
    print!("{}", render_database(&db));
}

/// ```text
/// Game.Box`1, Game.Runtime  id=box-guid  selector=1c9e...
///   Box<Int32>  module=5a1f...  generated
/// menu items  module=77ab...
///   Stashes/Stash (10) -> Game.Stash`1
/// ```
pub(crate) fn render_database(db: &GenerationDatabase) -> String {
    let mut out = String::new();

    if db.is_empty() {
        out.push_str("(empty database)\n");
        return out;
    }

    for (generic, descriptor) in db.generics() {
        let _ = write!(out, "{}  id={}", descriptor.name, descriptor.durable_id);
        if let Some(selector) = &descriptor.selector_module {
            let _ = write!(out, "  selector={selector}");
        }
        out.push('\n');

        for inst in db.instantiations(generic) {
            let label = db.argument_names(inst).map_or_else(
                || "<dangling arguments>".to_string(),
                |arguments| closed_display_name(&descriptor.name, &arguments),
            );
            let origin = if inst.is_generated() { "generated" } else { "hand-written" };
            let _ = writeln!(out, "  {label}  module={}  {origin}", inst.module);
        }
    }

    if let Some(module) = db.menu_module() {
        let _ = writeln!(out, "menu items  module={module}");
    }
    for item in db.menu_items() {
        let _ = writeln!(
            out,
            "  {} ({}) -> {}",
            item.menu_name,
            item.order,
            item.generic.full_name()
        );
    }

    let _ = writeln!(
        out,
        "{} generic definitions, {} instantiations, {} argument types",
        db.generic_count(),
        db.instantiation_count(),
        db.argument_count()
    );
    out
}
