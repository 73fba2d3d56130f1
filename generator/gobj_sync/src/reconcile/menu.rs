//! The generated menu items module.

use gobj_db::MenuItem;

use super::Pass;
use crate::services::{LoadedType, ModuleTemplate};

/// Output name of the single menu items module.
pub(crate) const MENU_ITEMS_MODULE: &str = "GeneratedMenuItems";

impl Pass<'_, '_> {
    /// Create, replace or delete the menu items module so that it lists
    /// exactly the asset menus declared on the loaded definitions.
    pub(super) fn sync_menu_items(&mut self, definitions: &[LoadedType]) {
        let mut items: Vec<MenuItem> = definitions
            .iter()
            .filter_map(|ty| {
                ty.asset_menu.as_ref().map(|menu| MenuItem {
                    file_name: menu.file_name.clone(),
                    menu_name: menu.menu_name.clone(),
                    order: menu.order,
                    generic: ty.name.clone(),
                })
            })
            .collect();
        items.sort();
        items.dedup();

        let existing = self.db.menu_module().cloned();

        if items.is_empty() {
            if let Some(module) = existing {
                tracing::debug!("no asset menus left, deleting menu items module");
                self.delete_modules([&module]);
                self.db.set_menu_module(None);
            }
            self.db.set_menu_items(Vec::new());
            return;
        }

        let up_to_date = self.db.menu_items() == items.as_slice()
            && existing
                .as_ref()
                .is_some_and(|module| self.services.modules.module_exists(module));
        if up_to_date {
            return;
        }

        let template = ModuleTemplate::MenuItems {
            items: items.clone(),
        };
        match self.generate(&template, MENU_ITEMS_MODULE) {
            Ok(module) => {
                tracing::debug!(entries = items.len(), "menu items module generated");
                self.db.set_menu_module(Some(module));
                self.db.set_menu_items(items);
            }
            Err(err) => {
                tracing::warn!(%err, "failed to generate menu items module");
                self.report.dropped += 1;
                // Forget the entries so the next pass tries again.
                self.db.set_menu_items(Vec::new());
            }
        }
    }
}
