//! Tracing setup for the CLI.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Filtering comes from `GOBJ_LOG`, falling back to `RUST_LOG`; without
/// either nothing is installed. Setting `GOBJ_LOG_TREE` switches to an
/// indented span tree, which reads better for reconciliation passes.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directives = std::env::var("GOBJ_LOG").or_else(|_| std::env::var("RUST_LOG"));
        let Ok(directives) = directives else {
            return;
        };
        let filter = EnvFilter::new(directives);

        let tree = std::env::var_os("GOBJ_LOG_TREE").is_some();
        let tree_layer = tree.then(|| {
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_writer(std::io::stderr)
        });
        let fmt_layer = (!tree).then(|| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
        });

        tracing_subscriber::registry()
            .with(tree_layer)
            .with(fmt_layer)
            .with(filter)
            .init();
    });
}
