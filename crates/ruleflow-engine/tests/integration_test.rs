//! 工作流评估集成测试
//!
//! 以 JSON 文档驱动完整的加载、评估流程。

mod common;

use chrono::DateTime;
use common::{document, init_tracing, lists};
use ruleflow::{
    Decision, EvaluationMode, FixedClock, NamedLists, WorkflowExecutor, WorkflowLoader, evaluate,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

fn prop(path: &str) -> Value {
    json!({"type": "property", "segments": path.split('.').collect::<Vec<_>>()})
}

fn elem(path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    json!({"type": "property", "qualifier": "elem", "segments": segments})
}

fn lit(value: Value) -> Value {
    json!({"type": "literal", "value": value})
}

fn cmp(op: &str, left: Value, right: Value) -> Value {
    json!({"type": "compare", "op": op, "left": left, "right": right})
}

/// 单规则集单规则的工作流
fn single_rule_workflow(rule_name: &str, condition: Value) -> Value {
    json!({
        "name": "test",
        "rulesets": [{
            "name": "dummy",
            "rules": [{
                "name": rule_name,
                "condition": condition,
                "outcome": {"state": "block"}
            }]
        }],
        "default": {"outcome": {"state": "allow"}}
    })
}

fn run(workflow: Value, payload: Value) -> Decision {
    init_tracing();
    evaluate(&document(workflow), &payload, &NamedLists::new()).unwrap()
}

fn run_with_lists(workflow: Value, payload: Value, named: &NamedLists) -> Decision {
    init_tracing();
    evaluate(&document(workflow), &payload, named).unwrap()
}

#[test]
fn test_version_string_comparison() {
    let decision = run(
        single_rule_workflow("version", cmp("<", prop("app.version"), lit(json!("7.53")))),
        json!({"app": {"version": "7.52.2.19911"}}),
    );
    assert_eq!(decision.result, "block");
    assert_eq!(decision.rule_id, "version");
}

#[test]
fn test_datetime_string_equality() {
    let decision = run(
        single_rule_workflow("date", cmp("=", prop("x"), lit(json!("2024-06-01T12:30Z")))),
        json!({"x": "2024-06-01T12:30Z"}),
    );
    assert_eq!(decision.result, "block");

    let condition = cmp(
        "=",
        json!({"type": "date", "value": prop("x")}),
        json!({"type": "date", "value": lit(json!("2024-06-01T12:30:00.000Z"))}),
    );
    let decision = run(
        single_rule_workflow("date", condition),
        json!({"x": "2024-06-01T12:30Z"}),
    );
    assert_eq!(decision.result, "block");
}

#[test]
fn test_ruleset_guard_missing_field_skips_ruleset() {
    let workflow = json!({
        "name": "test",
        "rulesets": [
            {
                "name": "adults",
                "condition": cmp(">=", prop("user.age"), lit(json!(18))),
                "rules": [{"name": "always", "condition": lit(json!(true)), "outcome": {"state": "adult"}}]
            },
            {
                "name": "fallback",
                "rules": [{"name": "country", "condition": cmp("=", prop("user.country"), lit(json!("CO"))), "outcome": {"state": "local"}}]
            }
        ],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"user": {"country": "CO"}}));
    assert_eq!(decision.ruleset_id, "fallback");
    assert_eq!(decision.result, "local");
    assert!(decision.warnings.contains("age field cannot be found"));
    assert!(!decision.error);
}

#[test]
fn test_ruleset_guard_false_is_silent() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{
            "name": "adults",
            "condition": cmp(">=", prop("user.age"), lit(json!(18))),
            "rules": [{"name": "always", "condition": lit(json!(true)), "outcome": {"state": "adult"}}]
        }],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"user": {"age": 10}}));
    assert!(decision.is_default());
    assert!(decision.warnings.is_empty());
}

#[test]
fn test_sequence_against_string_warning() {
    let decision = run(
        single_rule_workflow("comparison", cmp("=", prop("x"), lit(json!("some_string")))),
        json!({"x": ["a", "b"]}),
    );
    assert_eq!(decision.result, "allow");
    assert!(decision.is_default());
    assert!(
        decision
            .warnings
            .contains("There is a comparison between different dataTypes in rule comparison")
    );
    assert!(decision.error);
}

#[test]
fn test_list_aggregates() {
    let payload = json!({
        "order": {
            "items": [
                {"sku": "A", "price": 10},
                {"sku": "B", "price": 600}
            ]
        },
        "user": {"flags": ["new", "blocked"]}
    });

    let any = json!({
        "type": "aggregate", "mode": "any",
        "target": prop("order.items"),
        "predicate": cmp(">", prop("price"), lit(json!(500)))
    });
    assert_eq!(run(single_rule_workflow("any", any), payload.clone()).result, "block");

    let all = json!({
        "type": "aggregate", "mode": "all",
        "target": prop("order.items"),
        "predicate": cmp(">", elem("price"), lit(json!(500)))
    });
    assert_eq!(run(single_rule_workflow("all", all), payload.clone()).result, "allow");

    let none = json!({
        "type": "aggregate", "mode": "none",
        "target": prop("user.flags"),
        "predicate": lit(json!("vip"))
    });
    assert_eq!(run(single_rule_workflow("none", none), payload.clone()).result, "block");

    let primitive_any = json!({
        "type": "aggregate", "mode": "any",
        "target": prop("user.flags"),
        "predicate": lit(json!("blocked"))
    });
    assert_eq!(run(single_rule_workflow("flags", primitive_any), payload).result, "block");
}

#[test]
fn test_aggregate_predicate_references_outer_scope() {
    // 元素中不存在的字段回退到请求数据
    let any = json!({
        "type": "aggregate", "mode": "any",
        "target": prop("order.items"),
        "predicate": cmp("=", prop("sku"), prop("promo.sku"))
    });
    let decision = run(
        single_rule_workflow("promo", any),
        json!({"order": {"items": [{"sku": "A"}, {"sku": "B"}]}, "promo": {"sku": "B"}}),
    );
    assert_eq!(decision.result, "block");
}

#[test]
fn test_stored_list_with_map_elements() {
    let named = lists(&[(
        "blacklist",
        json!([
            {"field1": "test", "field2": "other"},
            {"field1": "a", "field2": "b"}
        ]),
    )]);

    let scalar = json!({
        "type": "membership", "op": "in",
        "value": prop("user.name"),
        "collection": {"type": "stored_list", "name": "blacklist"}
    });
    let decision = run_with_lists(
        single_rule_workflow("scalar", scalar),
        json!({"user": {"name": "other"}}),
        &named,
    );
    assert_eq!(decision.result, "block");

    let tuple = json!({
        "type": "membership", "op": "in",
        "value": {"type": "tuple", "items": [prop("x"), prop("y")]},
        "collection": {"type": "stored_list", "name": "blacklist"}
    });
    let decision = run_with_lists(
        single_rule_workflow("tuple", tuple.clone()),
        json!({"x": "a", "y": "b"}),
        &named,
    );
    assert_eq!(decision.result, "block");

    let decision = run_with_lists(
        single_rule_workflow("tuple", tuple),
        json!({"x": "b", "y": "a"}),
        &named,
    );
    assert_eq!(decision.result, "allow");
}

#[test]
fn test_stored_list_string_operators() {
    let named = lists(&[("domains", json!(["@fraud.com", "@spam.org"]))]);

    let ends_with = json!({
        "type": "membership", "op": "ends_with",
        "value": prop("user.email"),
        "collection": {"type": "stored_list", "name": "domains"}
    });
    let decision = run_with_lists(
        single_rule_workflow("domain", ends_with),
        json!({"user": {"email": "bob@spam.org"}}),
        &named,
    );
    assert_eq!(decision.result, "block");

    let missing_list = json!({
        "type": "membership", "op": "in",
        "value": prop("user.email"),
        "collection": {"type": "stored_list", "name": "unknown"}
    });
    let decision = run_with_lists(
        single_rule_workflow("missing", missing_list),
        json!({"user": {"email": "bob@spam.org"}}),
        &named,
    );
    assert_eq!(decision.result, "allow");
    assert!(decision.warnings.is_empty());
}

#[test]
fn test_eval_in_list() {
    let named = lists(&[("blacklist", json!([{"field1": "other"}, {"field1": "test"}]))]);
    let condition = json!({
        "type": "eval_in_list",
        "list": "blacklist",
        "predicate": cmp("=", elem("field1"), lit(json!("test")))
    });

    let decision = run_with_lists(single_rule_workflow("eval", condition.clone()), json!({}), &named);
    assert_eq!(decision.result, "block");

    let absent = json!({
        "type": "eval_in_list",
        "list": "absent",
        "predicate": cmp("=", elem("field1"), lit(json!("test")))
    });
    let decision = run_with_lists(single_rule_workflow("eval", absent), json!({}), &named);
    assert_eq!(decision.result, "allow");
    assert!(decision.warnings.is_empty());
}

#[test]
fn test_eval_in_list_with_outer_reference() {
    let named = lists(&[(
        "accounts",
        json!([
            {"id": "u1", "risk": "low"},
            {"id": "u2", "risk": "high"}
        ]),
    )]);
    let condition = json!({
        "type": "eval_in_list",
        "list": "accounts",
        "predicate": {
            "type": "and",
            "left": cmp("=", elem("id"), prop("user.id")),
            "right": cmp("=", elem("risk"), lit(json!("high")))
        }
    });

    let decision = run_with_lists(
        single_rule_workflow("risky", condition.clone()),
        json!({"user": {"id": "u2"}}),
        &named,
    );
    assert_eq!(decision.result, "block");

    let decision = run_with_lists(
        single_rule_workflow("risky", condition),
        json!({"user": {"id": "u1"}}),
        &named,
    );
    assert_eq!(decision.result, "allow");
}

#[test]
fn test_action_calls() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{
            "name": "dummy",
            "rules": [{
                "name": "flagged",
                "condition": cmp("=", prop("user.status"), lit(json!("flagged"))),
                "outcome": {"state": "review"},
                "actions": [
                    {"name": "manual_review", "params": [
                        {"key": "user_id", "value": prop("user.id")},
                        {"key": "priority", "value": lit(json!("high"))}
                    ]},
                    {"name": "manual_review", "params": [
                        {"key": "user_id", "value": prop("user.id")},
                        {"key": "priority", "value": lit(json!("low"))}
                    ]},
                    {"name": "notify"}
                ]
            }]
        }],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"user": {"id": 7, "status": "flagged"}}));
    assert_eq!(decision.result, "review");
    assert_eq!(decision.action_calls.len(), 3);
    assert_eq!(decision.action_calls[0].name, "manual_review");
    assert_eq!(decision.action_calls[0].params.get("user_id"), Some("7"));
    assert_eq!(decision.action_calls[0].params.get("priority"), Some("high"));
    assert_eq!(decision.action_calls[1].params.get("priority"), Some("low"));
    assert_eq!(decision.action_calls[2].name, "notify");

    let grouped = decision.actions_by_name();
    assert_eq!(grouped["manual_review"].len(), 2);
    assert_eq!(grouped["notify"].len(), 1);
}

#[test]
fn test_action_parameter_fault_drops_actions() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{
            "name": "dummy",
            "rules": [{
                "name": "flagged",
                "condition": lit(json!(true)),
                "outcome": {"state": "review"},
                "actions": [
                    {"name": "ok", "params": [{"key": "a", "value": lit(json!("1"))}]},
                    {"name": "broken", "params": [{"key": "b", "value": prop("device.id")}]}
                ]
            }]
        }],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({}));
    assert_eq!(decision.result, "review");
    assert!(decision.action_calls.is_empty());
    assert_eq!(decision.warnings.len(), 1);
    assert!(!decision.error);
}

#[test]
fn test_multi_match() {
    let workflow = json!({
        "name": "test",
        "evaluation_mode": "multi_match",
        "rulesets": [
            {
                "name": "first",
                "rules": [
                    {"name": "r1", "condition": cmp(">", prop("score"), lit(json!(10))), "outcome": {"state": "low"},
                     "actions": [{"name": "tag", "params": [{"key": "level", "value": lit(json!("low"))}]}]},
                    {"name": "r2", "condition": cmp(">", prop("score"), lit(json!(100))), "outcome": {"state": "high"}}
                ]
            },
            {
                "name": "second",
                "rules": [
                    {"name": "broken", "condition": cmp(">", prop("missing"), lit(json!(1))), "outcome": {"state": "never"}},
                    {"name": "r3", "condition": cmp("<", prop("score"), lit(json!(1000))), "outcome": {"state": "bounded"}}
                ]
            }
        ],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"score": 50}));
    assert_eq!(decision.matched_rules.len(), 2);
    assert_eq!(decision.matched_rules[0].rule_id, "r1");
    assert_eq!(decision.matched_rules[1].rule_id, "r3");
    assert_eq!(decision.result, "low");
    assert_eq!(decision.rule_id, "r1");
    assert_eq!(decision.action_calls, decision.matched_rules[0].action_calls);
    assert!(decision.warnings.contains("missing field cannot be found"));
}

#[test]
fn test_multi_match_without_matches_uses_default() {
    let workflow = json!({
        "name": "test",
        "evaluation_mode": "multi",
        "rulesets": [{"name": "rs", "rules": [
            {"name": "r1", "condition": lit(json!(false)), "outcome": {"state": "x"}}
        ]}],
        "default": {
            "outcome": {"expr": prop("fallback")},
            "actions": [{"name": "log", "params": [{"key": "reason", "value": lit(json!("no match"))}]}]
        }
    });

    let decision = run(workflow, json!({"fallback": "manual"}));
    assert!(decision.is_default());
    assert!(decision.matched_rules.is_empty());
    assert_eq!(decision.result, "manual");
    assert_eq!(decision.action_calls[0].params.get("reason"), Some("no match"));
}

#[test]
fn test_outcome_expression() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{"name": "rs", "rules": [{
            "name": "score",
            "condition": lit(json!(true)),
            "outcome": {"expr": {"type": "arithmetic", "op": "*", "left": prop("base"), "right": lit(json!(2))}}
        }]}],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"base": 21}));
    assert_eq!(decision.result, "42");
}

#[test]
fn test_builtins_with_fixed_clock() {
    init_tracing();
    let workflow = document(json!({
        "name": "test",
        "rulesets": [{"name": "rs", "rules": [
            {
                "name": "recent_signup",
                "condition": cmp(
                    "<",
                    json!({"type": "date_diff", "unit": "day", "from": {"type": "date", "value": prop("user.signup")}, "to": {"type": "now"}}),
                    lit(json!(7))
                ),
                "outcome": {"state": "new_user"}
            },
            {
                "name": "nearby",
                "condition": {
                    "type": "within_radius",
                    "lat1": prop("geo.lat"), "lon1": prop("geo.lon"),
                    "lat2": lit(json!(0.0)), "lon2": lit(json!(1.0)),
                    "radius": lit(json!(120))
                },
                "outcome": {"state": "nearby"}
            }
        ]}],
        "default": {"outcome": {"state": "allow"}}
    }));

    let now = DateTime::parse_from_rfc3339("2024-06-10T00:00:00Z").unwrap();
    let executor = WorkflowExecutor::new().with_clock(Arc::new(FixedClock(now)));

    let decision = executor
        .execute(
            &workflow,
            &json!({"user": {"signup": "2024-06-05"}, "geo": {"lat": 0.0, "lon": 0.0}}),
            &NamedLists::new(),
        )
        .unwrap();
    assert_eq!(decision.rule_id, "recent_signup");

    let decision = executor
        .execute(
            &workflow,
            &json!({"user": {"signup": "2024-01-01"}, "geo": {"lat": 0.0, "lon": 0.0}}),
            &NamedLists::new(),
        )
        .unwrap();
    assert_eq!(decision.rule_id, "nearby");
}

#[test]
fn test_similarity_and_regex_rules() {
    let fuzzy = json!({
        "type": "compare", "op": ">=",
        "left": {"type": "similarity", "function": "token_set_ratio", "left": prop("user.name"), "right": lit(json!("john smith"))},
        "right": lit(json!(90))
    });
    assert_eq!(
        run(single_rule_workflow("fuzzy", fuzzy), json!({"user": {"name": "Smith, John A"}})).result,
        "block"
    );

    let regex = json!({"type": "regex", "value": prop("user.phone"), "pattern": lit(json!("\\+57\\d{10}"))});
    assert_eq!(
        run(single_rule_workflow("phone", regex.clone()), json!({"user": {"phone": "+573001234567"}})).result,
        "block"
    );
    assert_eq!(
        run(single_rule_workflow("phone", regex), json!({"user": {"phone": "+1 555 0100"}})).result,
        "allow"
    );
}

#[test]
fn test_decision_serialization() {
    let decision = run(
        single_rule_workflow("version", cmp("<", prop("v"), lit(json!("7.53")))),
        json!({"v": "7.1"}),
    );
    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["workflow"], "test");
    assert_eq!(json["ruleset_id"], "dummy");
    assert_eq!(json["rule_id"], "version");
    assert_eq!(json["result"], "block");
    assert_eq!(json["error"], false);
    assert!(json.get("matched_rules").is_none());
}

#[test]
fn test_loaded_workflow_evaluation() {
    init_tracing();
    let json = serde_json::to_string(&single_rule_workflow(
        "adult",
        cmp(">=", prop("user.age"), lit(json!(18))),
    ))
    .unwrap();

    let loaded = WorkflowLoader::new().load_from_json(&json).unwrap();
    assert_eq!(loaded.name(), "test");
    assert!(loaded.input_fields.contains("user.age"));
    assert_eq!(loaded.document.evaluation_mode, EvaluationMode::Single);

    let decision = WorkflowExecutor::new()
        .execute(&loaded.document, &json!({"user": {"age": 30}}), &NamedLists::new())
        .unwrap();
    assert_eq!(decision.result, "block");
}

#[test]
fn test_concurrent_evaluation_of_shared_document() {
    init_tracing();
    let mut loader = WorkflowLoader::new();
    let loaded = loader
        .load(document(single_rule_workflow(
            "big",
            cmp(">", prop("amount"), lit(json!(100))),
        )))
        .unwrap();
    let executor = WorkflowExecutor::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let doc = Arc::clone(&loaded.document);
            let executor = executor.clone();
            thread::spawn(move || {
                let amount = i * 50;
                let decision = executor
                    .execute(&doc, &json!({"amount": amount}), &NamedLists::new())
                    .unwrap();
                (amount, decision.result)
            })
        })
        .collect();

    for handle in handles {
        let (amount, result) = handle.join().unwrap();
        let expected = if amount > 100 { "block" } else { "allow" };
        assert_eq!(result, expected);
    }
}

#[test]
fn test_ruleset_guard_type_comparison_sets_error() {
    let workflow = json!({
        "name": "test",
        "rulesets": [
            {
                "name": "tagged",
                "condition": cmp("=", prop("tags"), lit(json!("vip"))),
                "rules": [{"name": "always", "condition": lit(json!(true)), "outcome": {"state": "vip"}}]
            },
            {
                "name": "fallback",
                "rules": [{"name": "any", "condition": lit(json!(true)), "outcome": {"state": "ok"}}]
            }
        ],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"tags": ["vip"]}));
    assert_eq!(decision.ruleset_id, "fallback");
    assert_eq!(decision.result, "ok");
    assert_eq!(decision.warnings.len(), 1);
    assert!(
        decision
            .warnings
            .contains("There is a comparison between different dataTypes in ruleset tagged")
    );
    assert!(decision.error);
}

#[test]
fn test_elem_outside_list_predicate_skips_rule() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{
            "name": "dummy",
            "rules": [
                {"name": "scoped", "condition": cmp("=", elem("status"), lit(json!("x"))), "outcome": {"state": "block"}},
                {"name": "plain", "condition": cmp("=", prop("status"), lit(json!("x"))), "outcome": {"state": "review"}}
            ]
        }],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({"status": "x"}));
    assert_eq!(decision.rule_id, "plain");
    assert_eq!(decision.result, "review");
    assert!(
        decision
            .warnings
            .contains("'elem.status' used outside of a list predicate")
    );
    assert!(!decision.error);
}

#[test]
fn test_nested_aggregates_bind_innermost_item() {
    // 外层元素也有 price 字段，elem.price 必须取内层元素
    let payload = |inner_price: u32| {
        json!({
            "orders": [
                {"id": "o1", "price": 900, "items": [{"price": 10}]},
                {"id": "o2", "price": 0, "items": [{"price": inner_price}]}
            ]
        })
    };
    let nested = |predicate: Value| {
        json!({
            "type": "aggregate", "mode": "any",
            "target": prop("orders"),
            "predicate": {
                "type": "aggregate", "mode": "any",
                "target": elem("items"),
                "predicate": predicate
            }
        })
    };

    let expensive = cmp(">", elem("price"), lit(json!(500)));
    let decision = run(single_rule_workflow("nested", nested(expensive.clone())), payload(900));
    assert_eq!(decision.result, "block");
    assert!(decision.warnings.is_empty());

    let decision = run(single_rule_workflow("nested", nested(expensive.clone())), payload(20));
    assert_eq!(decision.result, "allow");
    assert!(decision.warnings.is_empty());
    assert!(!decision.error);

    // 内层元素没有 id，简单路径回退到外层元素
    let with_outer = json!({
        "type": "and",
        "left": expensive,
        "right": cmp("=", prop("id"), lit(json!("o2")))
    });
    let decision = run(single_rule_workflow("nested", nested(with_outer)), payload(900));
    assert_eq!(decision.result, "block");
}

#[test]
fn test_eval_in_list_nested_elem_path_on_non_map_elements() {
    let condition = json!({
        "type": "eval_in_list",
        "list": "mixed",
        "predicate": cmp("=", elem("a.b"), lit(json!("hit")))
    });

    // 基本类型元素求值失败只视为不匹配；a 为文本时路径提前终止
    let named = lists(&[("mixed", json!(["plain", 42, {"a": "flat"}, {"a": {"b": "hit"}}]))]);
    let decision = run_with_lists(single_rule_workflow("mixed", condition.clone()), json!({}), &named);
    assert_eq!(decision.result, "block");
    assert!(decision.warnings.is_empty());
    assert!(!decision.error);

    let named = lists(&[("mixed", json!(["plain", 42, {"a": "flat"}]))]);
    let decision = run_with_lists(single_rule_workflow("mixed", condition), json!({}), &named);
    assert_eq!(decision.result, "allow");
    assert!(decision.warnings.is_empty());
    assert!(!decision.error);
}

#[test]
fn test_non_finite_text_is_not_numeric() {
    let decision = run(
        single_rule_workflow("inf", cmp("=", prop("x"), lit(json!("infinity")))),
        json!({"x": "inf"}),
    );
    assert_eq!(decision.result, "allow");
    assert!(decision.warnings.is_empty());

    let decision = run(
        single_rule_workflow("nan", cmp("=", prop("x"), lit(json!("nan")))),
        json!({"x": "nan"}),
    );
    assert_eq!(decision.result, "block");
}

#[test]
fn test_explicit_null_field_is_not_found() {
    let decision = run(
        single_rule_workflow("nickname", cmp("=", prop("user.nickname"), lit(json!("bob")))),
        json!({"user": {"nickname": null}}),
    );
    assert!(decision.is_default());
    assert!(decision.warnings.contains("nickname field cannot be found"));
    assert!(!decision.error);
}

#[test]
fn test_action_params_serialize_as_string_map() {
    let workflow = json!({
        "name": "test",
        "rulesets": [{"name": "rs", "rules": [{
            "name": "r",
            "condition": lit(json!(true)),
            "outcome": {"state": "review"},
            "actions": [{"name": "notify", "params": [
                {"key": "score", "value": lit(json!(7.5))},
                {"key": "flag", "value": lit(json!(true))}
            ]}]
        }]}],
        "default": {"outcome": {"state": "allow"}}
    });

    let decision = run(workflow, json!({}));
    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["action_calls"][0]["params"], json!({"score": "7.5", "flag": "true"}));
}
