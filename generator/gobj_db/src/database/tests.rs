use gobj_ident::{ArgumentDescriptor, DurableId, GenericTypeDescriptor, ModuleId, TypeName};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn generic(name: &str, id: &str, params: &[&str]) -> GenericTypeDescriptor {
    GenericTypeDescriptor::new(
        TypeName::new(name, "Game.Runtime"),
        DurableId::new(id),
        params.iter().map(ToString::to_string).collect(),
    )
}

fn arg(name: &str, id: &str) -> ArgumentDescriptor {
    ArgumentDescriptor::new(TypeName::new(name, "mscorlib"), DurableId::new(id))
}

fn module(id: &str) -> ModuleId {
    ModuleId::new(id)
}

fn add(
    db: &mut GenerationDatabase,
    generic: &GenericTypeDescriptor,
    arguments: &[ArgumentDescriptor],
    module_id: &str,
) -> GenericIdx {
    db.add_instantiation(generic, arguments, module(module_id))
        .unwrap_or_else(|e| panic!("add_instantiation failed: {e}"))
}

/// `Box<T>` with `Box<int>` and `Box<string>`, `Pair<K,V>` with `Pair<int,bool>`.
fn sample() -> (GenerationDatabase, GenericIdx, GenericIdx) {
    let mut db = GenerationDatabase::new();
    let boxed = generic("Game.Box`1", "box-guid", &["T"]);
    let pair = generic("Game.Pair`2", "pair-guid", &["K", "V"]);
    let b = add(&mut db, &boxed, &[arg("System.Int32", "int-guid")], "m-box-int");
    add(&mut db, &boxed, &[arg("System.String", "str-guid")], "m-box-str");
    let p = add(
        &mut db,
        &pair,
        &[arg("System.Int32", "int-guid"), arg("System.Boolean", "bool-guid")],
        "m-pair-int-bool",
    );
    (db, b, p)
}

#[test]
fn add_registers_generic_and_shared_arguments() {
    let (db, b, p) = sample();

    assert_eq!(db.generic_count(), 2);
    assert_eq!(db.instantiation_count(), 3);
    // int is shared by Box<int> and Pair<int,bool>
    assert_eq!(db.argument_count(), 3);

    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));
    assert_eq!(db.instantiations(b)[0].arguments, vec![int]);
    assert_eq!(db.instantiations(p)[0].arguments[0], int);
}

#[test]
fn duplicate_tuple_is_rejected() {
    let (mut db, _, _) = sample();
    let boxed = generic("Game.Box`1", "box-guid", &["T"]);

    let err = db
        .add_instantiation(&boxed, &[arg("System.Int32", "int-guid")], module("other"))
        .err();

    assert!(matches!(
        err,
        Some(DatabaseError::DuplicateInstantiation { .. })
    ));
    assert_eq!(db.instantiation_count(), 3);
}

#[test]
fn argument_order_matters() {
    let mut db = GenerationDatabase::new();
    let pair = generic("Game.Pair`2", "pair-guid", &["K", "V"]);
    let a = arg("A", "a");
    let b = arg("B", "b");

    add(&mut db, &pair, &[a.clone(), b.clone()], "ab");
    add(&mut db, &pair, &[b, a], "ba");

    assert_eq!(db.instantiation_count(), 2);
}

#[test]
fn arity_mismatch_is_rejected() {
    let mut db = GenerationDatabase::new();
    let pair = generic("Game.Pair`2", "pair-guid", &["K", "V"]);

    let err = db
        .add_instantiation(&pair, &[arg("A", "a")], module("m"))
        .err();

    assert_eq!(
        err,
        Some(DatabaseError::ArityMismatch {
            generic: pair.name.clone(),
            expected: 2,
            found: 1,
        })
    );
    assert_eq!(db.argument_count(), 0);
}

#[test]
fn rejected_duplicate_leaves_no_orphans() {
    let (mut db, _, _) = sample();
    let before = db.argument_count();
    let boxed = generic("Game.Box`1", "box-guid", &["T"]);

    let _ = db.add_instantiation(&boxed, &[arg("System.Int32", "int-guid")], module("x"));

    assert_eq!(db.argument_count(), before);
}

#[test]
fn remove_last_user_prunes_argument() {
    let (mut db, b, _) = sample();
    let string = db
        .find_argument_by_name(&TypeName::new("System.String", "mscorlib"))
        .unwrap_or_else(|| panic!("string argument missing"));

    let removed = db.remove_instantiation(b, &[string]);

    assert_eq!(removed.map(|inst| inst.module), Some(module("m-box-str")));
    assert!(db.argument(string).is_none());
    assert!(db
        .find_argument_by_name(&TypeName::new("System.String", "mscorlib"))
        .is_none());
}

#[test]
fn remove_keeps_argument_still_in_use() {
    let (mut db, b, _) = sample();
    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));

    db.remove_instantiation(b, &[int]);

    // Pair<int,bool> still uses it
    assert!(db.argument(int).is_some());
    assert_eq!(db.referencing_generics(int).len(), 1);
}

#[test]
fn reverse_lookup_spans_generics() {
    let (db, b, p) = sample();
    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));

    let found: Vec<(GenericIdx, String)> = db
        .find_instantiations_referencing(int)
        .into_iter()
        .map(|(g, inst)| (g, inst.module.to_string()))
        .collect();

    assert_eq!(
        found,
        vec![
            (b, "m-box-int".to_string()),
            (p, "m-pair-int-bool".to_string())
        ]
    );
}

#[test]
fn remove_argument_removes_every_user() {
    let (mut db, _, _) = sample();
    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));

    let removed = db.remove_argument(int);

    assert_eq!(removed.len(), 2);
    assert_eq!(db.instantiation_count(), 1);
    // bool was only used by Pair<int,bool>
    assert!(db
        .find_argument_by_id(&DurableId::new("bool-guid"))
        .is_none());
    assert_eq!(db.argument_count(), 1);
}

#[test]
fn remove_generic_returns_generated_modules() {
    let (mut db, b, _) = sample();
    db.set_selector_module(b, Some(module("m-box-selector")));

    let removed = db
        .remove_generic(b)
        .unwrap_or_else(|| panic!("Box should be removable"));
    let modules: Vec<&str> = removed.generated_modules().map(ModuleId::as_str).collect();

    assert_eq!(modules, vec!["m-box-selector", "m-box-int", "m-box-str"]);
    assert!(db.generic(b).is_none());
    assert_eq!(db.generic_count(), 1);
    // string only belonged to Box
    assert_eq!(db.argument_count(), 2);
}

#[test]
fn generic_rename_keeps_instantiations() {
    let (mut db, b, _) = sample();
    let before: Vec<ConcreteInstantiation> = db.instantiations(b).to_vec();
    let new_name = TypeName::new("Game.Crate`1", "Game.Runtime");

    db.update_generic_identity(b, new_name.clone())
        .unwrap_or_else(|e| panic!("rename failed: {e}"));

    assert_eq!(db.instantiations(b), before.as_slice());
    assert_eq!(db.find_generic_by_name(&new_name), Some(b));
    assert!(db
        .find_generic_by_name(&TypeName::new("Game.Box`1", "Game.Runtime"))
        .is_none());
    assert_eq!(
        db.generic(b).map(|g| g.durable_id.clone()),
        Some(DurableId::new("box-guid"))
    );
}

#[test]
fn generic_rename_onto_existing_name_is_rejected() {
    let (mut db, b, p) = sample();
    let pair_name = db
        .generic(p)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| panic!("pair missing"));

    let err = db.update_generic_identity(b, pair_name.clone()).err();

    assert_eq!(err, Some(DatabaseError::NameTaken(pair_name)));
}

#[test]
fn argument_rename_is_seen_by_every_instantiation() {
    let (mut db, b, p) = sample();
    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));
    let renamed = TypeName::new("System.Int64", "mscorlib");

    db.update_argument_identity(int, renamed.clone())
        .unwrap_or_else(|e| panic!("rename failed: {e}"));

    assert!(db.find_instantiation(b, &[renamed.clone()]).is_some());
    let pair_names = db
        .argument_names(&db.instantiations(p)[0])
        .unwrap_or_default();
    assert_eq!(pair_names[0], renamed);
}

#[test]
fn argument_durable_id_update_keeps_links() {
    let (mut db, b, _) = sample();
    let int = db
        .find_argument_by_id(&DurableId::new("int-guid"))
        .unwrap_or_else(|| panic!("int argument missing"));

    db.update_argument_durable_id(int, DurableId::new("new-guid"))
        .unwrap_or_else(|e| panic!("update failed: {e}"));

    assert_eq!(db.find_argument_by_id(&DurableId::new("new-guid")), Some(int));
    assert!(db.find_argument_by_id(&DurableId::new("int-guid")).is_none());
    assert_eq!(db.referencing_generics(int).len(), 2);
    assert!(db.instantiations(b).iter().any(|inst| inst.uses(int)));
}

#[test]
fn generic_durable_id_update_keeps_links() {
    let (mut db, b, _) = sample();

    db.update_generic_durable_id(b, DurableId::new("box-guid-2"))
        .unwrap_or_else(|e| panic!("update failed: {e}"));

    assert_eq!(db.find_generic_by_id(&DurableId::new("box-guid-2")), Some(b));
    assert_eq!(db.instantiations(b).len(), 2);
}

#[test]
fn mutations_mark_dirty() {
    let (mut db, b, _) = sample();
    assert!(db.is_dirty());

    db.mark_clean();
    db.update_generic_identity(b, TypeName::new("Game.Box`1", "Game.Runtime"))
        .unwrap_or_else(|e| panic!("no-op rename failed: {e}"));
    assert!(!db.is_dirty(), "renaming to the same name is a no-op");

    db.set_selector_module(b, Some(module("sel")));
    assert!(db.is_dirty());
}

#[test]
fn name_only_argument_learns_durable_id() {
    let mut db = GenerationDatabase::new();
    let boxed = generic("Game.Box`1", "box-guid", &["T"]);
    let list = generic("Game.List`1", "list-guid", &["T"]);
    add(&mut db, &boxed, &[arg("System.Int32", "")], "m1");
    add(&mut db, &list, &[arg("System.Int32", "int-guid")], "m2");

    assert_eq!(db.argument_count(), 1);
    assert!(db.find_argument_by_id(&DurableId::new("int-guid")).is_some());
}

#[derive(Clone, Debug)]
enum Op {
    Add { generic: usize, args: Vec<usize> },
    Remove { generic: usize, args: Vec<usize> },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let tuple = prop::collection::vec(0usize..3, 1..=1);
    prop_oneof![
        (0usize..2, tuple.clone()).prop_map(|(generic, args)| Op::Add { generic, args }),
        (0usize..2, tuple).prop_map(|(generic, args)| Op::Remove { generic, args }),
    ]
}

proptest! {
    #[test]
    fn tuples_stay_unique_and_arguments_stay_referenced(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let generics = [
            generic("Game.Box`1", "box-guid", &["T"]),
            generic("Game.List`1", "list-guid", &["T"]),
        ];
        let pool = [arg("A", "a"), arg("B", "b"), arg("C", "c")];
        let mut db = GenerationDatabase::new();

        for op in ops {
            match op {
                Op::Add { generic, args } => {
                    let args: Vec<ArgumentDescriptor> = args.iter().map(|&i| pool[i].clone()).collect();
                    let _ = db.add_instantiation(&generics[generic], &args, module("m"));
                }
                Op::Remove { generic, args } => {
                    let Some(g) = db.find_generic_by_name(&generics[generic].name) else { continue };
                    let names: Vec<TypeName> = args.iter().map(|&i| pool[i].name.clone()).collect();
                    let tuple = db.find_instantiation(g, &names).map(|inst| inst.arguments.clone());
                    if let Some(tuple) = tuple {
                        db.remove_instantiation(g, &tuple);
                    }
                }
            }
        }

        for (g, _) in db.generics() {
            let tuples: Vec<&Vec<ArgumentIdx>> = db.instantiations(g).iter().map(|i| &i.arguments).collect();
            let mut deduped = tuples.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(tuples.len(), deduped.len());
        }
        for (a, _) in db.arguments() {
            prop_assert!(!db.find_instantiations_referencing(a).is_empty());
        }
    }
}
