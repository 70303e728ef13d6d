//! End-to-end tests driving the public `songlang_interpreter` API:
//! tokenize, parse, and execute a whole program, then inspect its
//! output lines and resulting graph.

use songlang_interpreter::{run, run_with_seed, ErrorKind, SongError, Value};

fn output_of(source: &str) -> Vec<String> {
    let (_interpreter, output) = run(source, |_| {}).expect("program should execute");
    output
}

// ── Concrete end-to-end scenarios ───────────────────────────────────

#[test]
fn s1_has_then_print_falls_back_to_node_name() {
    assert_eq!(output_of("Player HAS HP 100\nPlayer PRINT\n"), vec!["Player"]);
}

#[test]
fn s2_print_prefers_an_inherited_name_property() {
    let out = output_of("Player IS Entity\nPlayer HAS Name \"Hero\"\nPlayer PRINT\n");
    assert_eq!(out, vec!["Hero"]);
}

#[test]
fn s3_of_desugars_and_recomputes_a_property() {
    let out = output_of("Goblin HAS HP 50\nGoblin HAS HP (HP OF Goblin - 10)\nGoblin.HP PRINT\n");
    assert_eq!(out, vec!["40"]);
}

#[test]
fn s4_when_expression_runs_the_matching_branch_with_else() {
    let out = output_of(
        "Player HAS HP 0\nPlayer WHEN (HP == 0) DO Player PRINT ELSE DO Player HAS HP 1 END\n",
    );
    assert_eq!(out, vec!["Player"]);
}

#[test]
fn s5_query_is_materializes_every_match_in_insertion_order() {
    let out = output_of("Orc IS Monster\nGoblin IS Monster\n?m IS Monster\n");
    assert_eq!(out, vec!["Query ?m: 2 nodes found", "  - Orc", "  - Goblin"]);
}

#[test]
fn s6_query_can_matches_through_inheritance() {
    let out = output_of("Knight CAN ATTACK\nSquire IS Knight\n?w CAN ATTACK\n");
    assert_eq!(out, vec!["Query ?w: 2 nodes found", "  - Knight", "  - Squire"]);
}

// ── Invariants (spec §8) ─────────────────────────────────────────────

#[test]
fn invariant_missing_property_is_null_and_dot_access_errors() {
    let (interpreter, _) = run("Player IS Entity\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    assert_eq!(interpreter.graph.get_property(player, "Missing"), None);

    let result = run("Player IS Entity\nPlayer.Missing PRINT\n", |_| {});
    match result {
        Err(SongError::Interpreter(err)) => assert_eq!(err.kind, ErrorKind::PropertyNotFound),
        other => panic!("expected a PropertyNotFound interpreter error, got {other:?}"),
    }
}

#[test]
fn invariant_add_parent_is_idempotent() {
    let (interpreter, _) = run("Player IS Entity\nPlayer IS Entity\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    assert_eq!(interpreter.graph.node(player).parents.len(), 1);
}

#[test]
fn invariant_loses_is_restores_prior_parents() {
    let (interpreter, _) = run("Player IS Entity\nPlayer LOSES IS Entity\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    assert!(interpreter.graph.node(player).parents.is_empty());
}

#[test]
fn invariant_is_holds_for_self_and_transitively_through_chains() {
    let (interpreter, _) = run("Hero IS Entity\nPlayer IS Hero\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    assert!(interpreter.graph.is(player, "Player"));
    assert!(interpreter.graph.is(player, "Hero"));
    assert!(interpreter.graph.is(player, "Entity"));
}

#[test]
fn invariant_random_with_equal_bounds_is_exact_and_otherwise_in_range() {
    let (interpreter, output) =
        run_with_seed("Player HAS Roll (RANDOM 5 5)\nPlayer.Roll PRINT\n", 7, |_| {}).unwrap();
    assert_eq!(output, vec!["5"]);
    drop(interpreter);

    for seed in 0..20 {
        let (interpreter, _) =
            run_with_seed("Player HAS Roll (RANDOM 3 9)\n", seed, |_| {}).unwrap();
        let player = interpreter.graph.get_node_id("Player").unwrap();
        let Some(Value::Number(roll)) = interpreter.graph.get_property(player, "Roll").cloned()
        else {
            panic!("Roll should be a number");
        };
        assert!((3.0..=9.0).contains(&roll));
    }
}

#[test]
fn invariant_chance_zero_never_fires_chance_hundred_always_fires() {
    let (interpreter, _) = run_with_seed("CHANCE 0 DO Hit HAS Fired 1 END\n", 99, |_| {}).unwrap();
    assert!(interpreter.graph.get_node_id("Hit").is_none());

    let (interpreter, _) = run_with_seed("CHANCE 100 DO Hit HAS Fired 1 END\n", 99, |_| {}).unwrap();
    assert!(interpreter.graph.get_node_id("Hit").is_some());
}

#[test]
fn invariant_and_or_short_circuit_the_right_operand() {
    // If short-circuiting did not happen, evaluating `Undefined` on the
    // right would raise NodeNotFound and the whole program would fail.
    let out = output_of(
        "Flag HAS HP 0\n\
         Flag WHEN ((HP == 1) AND (Undefined - 1)) DO Flag PRINT END\n\
         Flag WHEN ((HP == 0) OR (Undefined - 1)) DO Flag PRINT END\n",
    );
    assert_eq!(out, vec!["Flag", "Flag"]);
}

#[test]
fn invariant_auto_promotion_depends_on_node_existence() {
    let (interpreter, _) =
        run("Sword HAS Damage 10\nPlayer HAS Weapon Sword\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    let sword = interpreter.graph.get_node_id("Sword").unwrap();
    assert_eq!(
        interpreter.graph.get_property(player, "Weapon").cloned(),
        Some(Value::NodeRef(sword))
    );

    let (interpreter, _) = run("Player HAS Weapon Sword\n", |_| {}).unwrap();
    let player = interpreter.graph.get_node_id("Player").unwrap();
    assert_eq!(
        interpreter.graph.get_property(player, "Weapon").cloned(),
        Some(Value::String("Sword".to_string()))
    );
}

// ── Additional behavior ──────────────────────────────────────────────

#[test]
fn custom_relation_with_two_roles_mutates_the_target_through_binding() {
    let source = "\
Attack IS RELATION\n\
Attack HAS Attacker (Node)\n\
Attack HAS Target (Node)\n\
Attack DO\n\
Target HAS HP (Target.HP - 10)\n\
END\n\
Goblin HAS HP 50\n\
Player Attack Goblin\n\
Goblin.HP PRINT\n";
    assert_eq!(output_of(source), vec!["40"]);
}

#[test]
fn invoking_a_non_relation_node_is_a_runtime_error() {
    let result = run("NotARelation HAS HP 1\nPlayer NotARelation\n", |_| {});
    match result {
        Err(SongError::Interpreter(err)) => assert_eq!(err.kind, ErrorKind::RuntimeError),
        other => panic!("expected a RuntimeError, got {other:?}"),
    }
}

#[test]
fn each_binds_the_loop_variable_without_leaking_across_iterations() {
    let source = "\
Goblin IS Monster\n\
Orc IS Monster\n\
Monster EACH m DO\n\
m PRINT\n\
END\n";
    assert_eq!(output_of(source), vec!["Goblin", "Orc"]);
}

#[test]
fn all_rebinds_a_has_action_to_every_matching_node() {
    let source = "\
Goblin IS Monster\n\
Orc IS Monster\n\
ALL Monster HAS Stunned 1\n\
Goblin.Stunned PRINT\n\
Orc.Stunned PRINT\n";
    assert_eq!(output_of(source), vec!["1", "1"]);
}

#[test]
fn query_where_filters_on_the_bound_candidate() {
    let source = "\
Goblin HAS HP 10\n\
Orc HAS HP 100\n\
Goblin IS Monster\n\
Orc IS Monster\n\
?m IS Monster WHERE (m.HP > 50)\n";
    assert_eq!(output_of(source), vec!["Query ?m: 1 nodes found", "  - Orc"]);
}

#[test]
fn division_by_zero_is_reported_with_the_spec_format() {
    let result = run("Player HAS X (1 / 0)\n", |_| {});
    match result {
        Err(SongError::Interpreter(err)) => {
            assert_eq!(err.kind, ErrorKind::DivisionByZero);
            assert!(err.to_string().starts_with("[Error] DivisionByZero:"));
        }
        other => panic!("expected a DivisionByZero error, got {other:?}"),
    }
}
