use super::*;
use crate::ports::{PageRequest, RestPage, TransportError, WorkflowSummary};
use crate::query::VariableValue;
use crate::test_support::{connection, ScriptedGraphQl, ScriptedRest};
use crate::usage::RunnerUsage;
use crate::{Login, WorkflowId};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

fn org() -> OrganizationName {
    OrganizationName::new("acme").unwrap()
}

fn client(graphql: &Arc<ScriptedGraphQl>, rest: &Arc<ScriptedRest>) -> AuditClient {
    AuditClient::new(graphql.clone(), rest.clone())
}

fn repositories_page(nodes: Value) -> Result<Value, TransportError> {
    Ok(json!({ "organization": { "repositories": connection("nodes", nodes, None, false) } }))
}

fn repository_node(name: &str, archived: bool) -> Value {
    json!({
        "owner": { "login": "acme" },
        "name": name,
        "isArchived": archived,
        "pushedAt": "2020-01-01T00:00:00Z"
    })
}

fn collaborators_page(edges: Value) -> Result<Value, TransportError> {
    Ok(json!({ "repository": { "collaborators": connection("edges", edges, None, false) } }))
}

fn team_members_page(edges: Value, end_cursor: Option<&str>, has_next: bool) -> Result<Value, TransportError> {
    Ok(json!({
        "organization": { "team": { "members": connection("edges", edges, end_cursor, has_next) } }
    }))
}

fn teams_page(nodes: Value) -> Result<Value, TransportError> {
    Ok(json!({ "organization": { "teams": connection("nodes", nodes, None, false) } }))
}

fn team_node(name: &str) -> Value {
    json!({
        "id": format!("T_{name}"),
        "name": name,
        "slug": name.to_lowercase(),
        "combinedSlug": format!("acme/{}", name.to_lowercase()),
        "parentTeam": null,
        "members": { "totalCount": 1 },
        "repositories": { "totalCount": 0 },
        "childTeams": { "totalCount": 0 }
    })
}

fn variable(value: &str) -> Option<VariableValue> {
    Some(VariableValue::String(value.into()))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_members_appends_pending_after_confirmed() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        Ok(json!({
            "organization": {
                "membersWithRole": connection(
                    "edges",
                    json!([{
                        "node": { "login": "alice", "name": "Alice", "email": null, "createdAt": "2020-01-01T00:00:00Z" },
                        "hasTwoFactorEnabled": true,
                        "role": "ADMIN"
                    }]),
                    None,
                    false
                )
            }
        })),
        Ok(json!({
            "organization": {
                "pendingMembers": connection(
                    "nodes",
                    json!([{ "login": "bob", "name": null, "email": "bob@example.com", "createdAt": "2021-01-01T00:00:00Z" }]),
                    None,
                    false
                )
            }
        })),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let members = client(&graphql, &rest).get_members(&org()).await.unwrap();

    assert_eq!(members.len(), 2);
    assert_eq!(members[0].login.as_str(), "alice");
    assert!(members[0].has_two_factor_enabled);
    assert_eq!(members[0].role, "ADMIN");
    assert!(members[0].email.is_empty());
    assert!(!members[0].pending);
    assert_eq!(members[1].login.as_str(), "bob");
    assert_eq!(members[1].email, "bob@example.com");
    assert!(members[1].pending);

    let calls = graphql.calls();
    assert_eq!(calls[0].variables.get("org").cloned(), variable("acme"));
}

#[tokio::test]
async fn get_members_fails_when_pending_fetch_fails() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        Ok(json!({ "organization": { "membersWithRole": connection("edges", json!([]), None, false) } })),
        Err(TransportError::GraphQl(vec!["Resource not accessible".into()])),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let err = client(&graphql, &rest).get_members(&org()).await.unwrap_err();

    assert!(matches!(
        err,
        AuditError::Transport {
            operation: "get_pending_members",
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_team_members_pages_per_team() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        team_members_page(json!([{ "node": { "login": "alice" }, "role": "MEMBER" }]), Some("m1"), true),
        team_members_page(json!([{ "node": { "login": "bob" }, "role": "MAINTAINER" }]), Some("m2"), false),
    ]));
    let rest = Arc::new(ScriptedRest::default());
    let mut teams = vec![Team {
        name: "Core".into(),
        slug: "core".into(),
        ..Team::default()
    }];

    client(&graphql, &rest)
        .load_team_members(&org(), &mut teams)
        .await
        .unwrap();

    let logins: Vec<_> = teams[0].members.iter().map(|m| m.login.as_str()).collect();
    assert_eq!(logins, vec!["alice", "bob"]);
    let calls = graphql.calls();
    assert_eq!(calls[0].variables.get("slug").cloned(), variable("core"));
    assert_eq!(calls[1].variables.get("cursor").cloned(), variable("m1"));
}

#[tokio::test]
async fn load_team_members_stops_at_first_failure() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        team_members_page(json!([{ "node": { "login": "alice" }, "role": "MEMBER" }]), None, false),
        Err(TransportError::Network("connection reset".into())),
        team_members_page(json!([{ "node": { "login": "carol" }, "role": "MEMBER" }]), None, false),
    ]));
    let rest = Arc::new(ScriptedRest::default());
    let mut teams: Vec<Team> = ["a", "b", "c"]
        .iter()
        .map(|slug| Team {
            slug: (*slug).into(),
            ..Team::default()
        })
        .collect();

    let result = client(&graphql, &rest)
        .load_team_members(&org(), &mut teams)
        .await;

    assert!(result.is_err());
    assert_eq!(teams[0].members.len(), 1);
    assert!(teams[1].members.is_empty());
    assert!(teams[2].members.is_empty());
    assert_eq!(graphql.call_count(), 2);
}

#[tokio::test]
async fn team_membership_audit_end_to_end() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        teams_page(json!([team_node("A"), team_node("B")])),
        team_members_page(json!([{ "node": { "login": "alice" }, "role": "member" }]), None, false),
        team_members_page(
            json!([
                { "node": { "login": "alice" }, "role": "maintainer" },
                { "node": { "login": "bob" }, "role": "member" }
            ]),
            None,
            false,
        ),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let audit = client(&graphql, &rest)
        .team_membership_audit(&org())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&audit).unwrap(),
        json!([
            {
                "login": "alice",
                "memberships": [
                    { "team_name": "A", "role": "member" },
                    { "team_name": "B", "role": "maintainer" }
                ]
            },
            { "login": "bob", "memberships": [ { "team_name": "B", "role": "member" } ] }
        ])
    );
}

#[tokio::test]
async fn team_permission_audit_end_to_end() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        teams_page(json!([team_node("Core")])),
        Ok(json!({
            "organization": {
                "team": {
                    "repositories": connection(
                        "edges",
                        json!([{ "node": { "owner": { "login": "acme" }, "name": "api" }, "permission": "WRITE" }]),
                        None,
                        false
                    )
                }
            }
        })),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let audit = client(&graphql, &rest)
        .team_permission_audit(&org())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&audit).unwrap(),
        json!([{
            "name": "Core",
            "permissions": [ { "repository_owner": "acme", "repository_name": "api", "role": "WRITE" } ]
        }])
    );
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collaborator_loading_never_queries_archived_repositories() {
    let graphql = Arc::new(ScriptedGraphQl::new([collaborators_page(json!([{
        "node": { "login": "alice" },
        "permission": "WRITE",
        "permissionSources": []
    }]))]));
    let rest = Arc::new(ScriptedRest::default());
    let mut repositories = vec![
        Repository {
            owner: "acme".into(),
            name: "old".into(),
            archived: true,
            ..Repository::default()
        },
        Repository {
            owner: "acme".into(),
            name: "api".into(),
            ..Repository::default()
        },
    ];

    client(&graphql, &rest)
        .load_repository_collaborators(&mut repositories)
        .await
        .unwrap();

    assert_eq!(graphql.call_count(), 1);
    assert_eq!(graphql.calls()[0].variables.get("repo").cloned(), variable("api"));
    assert!(repositories[0].collaborators.is_empty());
    assert_eq!(repositories[1].collaborators[0].login, Login::new("alice").unwrap());
}

#[tokio::test]
async fn collaborators_without_an_account_are_skipped() {
    let graphql = Arc::new(ScriptedGraphQl::new([collaborators_page(json!([
        { "node": null, "permission": "READ", "permissionSources": [] },
        { "node": { "login": "alice" }, "permission": "WRITE", "permissionSources": [] }
    ]))]));
    let rest = Arc::new(ScriptedRest::default());
    let mut repositories = vec![Repository {
        owner: "acme".into(),
        name: "api".into(),
        ..Repository::default()
    }];

    client(&graphql, &rest)
        .load_repository_collaborators(&mut repositories)
        .await
        .unwrap();

    let logins: Vec<_> = repositories[0]
        .collaborators
        .iter()
        .map(|c| c.login.as_str())
        .collect();
    assert_eq!(logins, vec!["alice"]);
}

#[tokio::test]
async fn member_permission_audit_end_to_end() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        repositories_page(json!([repository_node("repo1", false), repository_node("legacy", true)])),
        collaborators_page(json!([{
            "node": { "login": "alice" },
            "permission": "ADMIN",
            "permissionSources": [
                { "organization": { "name": "Acme" }, "permission": "WRITE",
                  "source": { "__typename": "Team", "name": "Core", "id": "T_1" } },
                { "organization": { "name": "Acme" }, "permission": "ADMIN",
                  "source": { "__typename": "Repository", "owner": { "login": "acme" }, "name": "repo1" } }
            ]
        }])),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let audit = client(&graphql, &rest)
        .member_permission_audit(&org())
        .await
        .unwrap();

    assert_eq!(graphql.call_count(), 2);
    assert_eq!(
        serde_json::to_value(&audit).unwrap(),
        json!([{
            "login": "alice",
            "permissions": [{
                "repository_owner": "acme",
                "repository_name": "repo1",
                "source": "Repository",
                "role": "ADMIN"
            }]
        }])
    );
}

#[tokio::test]
async fn full_audit_combines_members_and_repositories() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        Ok(json!({ "organization": { "membersWithRole": connection("edges", json!([]), None, false) } })),
        Ok(json!({ "organization": { "pendingMembers": connection("nodes", json!([]), None, false) } })),
        repositories_page(json!([repository_node("api", false)])),
        collaborators_page(json!([])),
    ]));
    let rest = Arc::new(ScriptedRest::default());

    let audit = client(&graphql, &rest).full_audit(&org()).await.unwrap();

    assert!(audit.members.is_empty());
    assert_eq!(audit.repositories.len(), 1);
    assert_eq!(audit.repositories[0].full_name(), "acme/api");
    assert_eq!(graphql.call_count(), 4);
}

#[tokio::test]
async fn branch_rules_and_languages_attach_to_repositories() {
    let graphql = Arc::new(ScriptedGraphQl::new([
        Ok(json!({
            "repository": {
                "languages": connection("edges", json!([{ "node": { "name": "Rust" }, "size": 1200 }]), None, false)
            }
        })),
        Ok(json!({
            "repository": {
                "branchProtectionRules": connection(
                    "nodes",
                    json!([{ "pattern": "main", "requiresApprovingReviews": true, "requiredApprovingReviewCount": 2 }]),
                    None,
                    false
                )
            }
        })),
    ]));
    let rest = Arc::new(ScriptedRest::default());
    let client = client(&graphql, &rest);
    let mut repositories = vec![Repository {
        owner: "acme".into(),
        name: "api".into(),
        ..Repository::default()
    }];

    client.load_repository_languages(&mut repositories).await.unwrap();
    client
        .load_repository_branch_protection_rules(&mut repositories)
        .await
        .unwrap();

    assert_eq!(repositories[0].languages[0].name, "Rust");
    assert_eq!(repositories[0].languages[0].lines_of_code, 1200);
    let rule = &repositories[0].branch_protection_rules[0];
    assert_eq!(rule.pattern, "main");
    assert!(rule.requires_approving_reviews);
    assert_eq!(rule.required_approving_review_count, 2);
}

#[tokio::test]
async fn page_bound_applies_to_fetchers() {
    let graphql = Arc::new(ScriptedGraphQl::new([Ok(json!({
        "organization": {
            "repositories": connection("nodes", json!([repository_node("api", false)]), Some("r1"), true)
        }
    }))]));
    let rest = Arc::new(ScriptedRest::default());

    let err = client(&graphql, &rest)
        .with_max_pages(Some(1))
        .get_organization_repositories(&org())
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::PageLimitExceeded { limit: 1, .. }));
}

// ---------------------------------------------------------------------------
// REST-backed fetchers
// ---------------------------------------------------------------------------

fn summary(id: u64, name: &str) -> WorkflowSummary {
    WorkflowSummary {
        id: WorkflowId::new(id),
        name: name.into(),
        path: format!(".github/workflows/{name}.yml"),
        state: "active".into(),
    }
}

#[tokio::test]
async fn actions_audit_weighs_workflow_usage() {
    let graphql = Arc::new(ScriptedGraphQl::new([repositories_page(json!([
        repository_node("a", false),
        repository_node("b", false)
    ]))]));
    let rest = Arc::new(ScriptedRest {
        workflow_pages: std::sync::Mutex::new(HashMap::from([
            ("acme/a".to_string(), VecDeque::from([RestPage::last(vec![summary(1, "ci")])])),
            ("acme/b".to_string(), VecDeque::from([RestPage::last(vec![summary(2, "ci")])])),
        ])),
        usage: HashMap::from([
            (1, RunnerUsage::new(100, 50, 10)),
            (2, RunnerUsage::new(100, 50, 10)),
        ]),
        ..ScriptedRest::default()
    });

    let audit = client(&graphql, &rest).actions_audit(&org()).await.unwrap();

    assert_eq!(audit.total_usage_weighted.as_u64(), 600);
    assert_eq!(audit.actions.len(), 2);
    assert!(audit
        .actions
        .iter()
        .all(|a| a.usage_weighted.as_u64() == 300 && a.fraction_of_total_usage.as_f64() == 0.5));
}

#[tokio::test]
async fn workflows_are_listed_across_pages_then_timed() {
    let graphql = Arc::new(ScriptedGraphQl::default());
    let rest = Arc::new(ScriptedRest {
        workflow_pages: std::sync::Mutex::new(HashMap::from([(
            "acme/api".to_string(),
            VecDeque::from([
                RestPage {
                    items: vec![summary(1, "build")],
                    next_page: Some(2),
                },
                RestPage::last(vec![summary(2, "release")]),
            ]),
        )])),
        usage: HashMap::from([(1, RunnerUsage::new(5, 0, 0)), (2, RunnerUsage::new(0, 0, 1))]),
        ..ScriptedRest::default()
    });
    let mut repositories = vec![Repository {
        owner: "acme".into(),
        name: "api".into(),
        ..Repository::default()
    }];

    client(&graphql, &rest)
        .load_repository_workflows(&mut repositories)
        .await
        .unwrap();

    let workflows = &repositories[0].workflows;
    assert_eq!(workflows.len(), 2);
    assert_eq!(workflows[0].name, "build");
    assert_eq!(workflows[0].usage_ubuntu, 5);
    assert_eq!(workflows[1].path, ".github/workflows/release.yml");
    assert_eq!(workflows[1].usage_mac, 1);
    assert_eq!(
        rest.calls(),
        vec![
            "list_workflows acme/api page=1",
            "list_workflows acme/api page=2",
            "get_workflow_usage acme/api 1",
            "get_workflow_usage acme/api 2",
        ]
    );
}

#[tokio::test]
async fn missing_workflow_usage_fails_the_load() {
    let graphql = Arc::new(ScriptedGraphQl::default());
    let rest = Arc::new(ScriptedRest {
        workflow_pages: std::sync::Mutex::new(HashMap::from([(
            "acme/api".to_string(),
            VecDeque::from([RestPage::last(vec![summary(9, "ghost")])]),
        )])),
        ..ScriptedRest::default()
    });
    let mut repositories = vec![Repository {
        owner: "acme".into(),
        name: "api".into(),
        ..Repository::default()
    }];

    let err = client(&graphql, &rest)
        .load_repository_workflows(&mut repositories)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuditError::Transport {
            source: TransportError::Http { status: 404, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn security_config_records_alert_state() {
    let graphql = Arc::new(ScriptedGraphQl::default());
    let rest = Arc::new(ScriptedRest {
        alerts_enabled: HashMap::from([("acme/api".to_string(), true)]),
        ..ScriptedRest::default()
    });
    let mut repositories = vec![
        Repository {
            owner: "acme".into(),
            name: "api".into(),
            ..Repository::default()
        },
        Repository {
            owner: "acme".into(),
            name: "web".into(),
            ..Repository::default()
        },
    ];

    client(&graphql, &rest)
        .load_repository_security_config(&mut repositories)
        .await
        .unwrap();

    assert!(repositories[0].vulnerability_alerts);
    assert!(!repositories[1].vulnerability_alerts);
}

#[tokio::test]
async fn create_repository_sends_empty_strings_as_absent() {
    let graphql = Arc::new(ScriptedGraphQl::default());
    let rest = Arc::new(ScriptedRest::default());
    let repository = Repository {
        name: "new-service".into(),
        private: true,
        description: "A new service".into(),
        ..Repository::default()
    };

    client(&graphql, &rest)
        .create_repository(&org(), &repository)
        .await
        .unwrap();

    let created = rest.created.lock().unwrap().clone();
    assert_eq!(
        created,
        vec![CreateRepositoryRequest {
            name: "new-service".into(),
            private: true,
            description: Some("A new service".into()),
            homepage: None,
        }]
    );
}

#[tokio::test]
async fn public_keys_are_collected_across_pages() {
    let graphql = Arc::new(ScriptedGraphQl::default());
    let key = |id: i64| PublicKey {
        id: Some(id),
        key: Some(format!("ssh-ed25519 AAAA{id}")),
        ..PublicKey::default()
    };
    let rest = Arc::new(ScriptedRest {
        key_pages: std::sync::Mutex::new(VecDeque::from([
            Ok(RestPage {
                items: vec![key(1)],
                next_page: Some(2),
            }),
            Ok(RestPage::last(vec![key(2)])),
        ])),
        ..ScriptedRest::default()
    });

    let keys = client(&graphql, &rest).list_public_keys("octocat").await.unwrap();

    assert_eq!(keys, vec![key(1), key(2)]);
    assert_eq!(
        rest.calls(),
        vec!["list_public_keys octocat page=1", "list_public_keys octocat page=2"]
    );
}

#[test]
fn first_page_request_uses_maximum_page_size() {
    assert_eq!(
        PageRequest::first(),
        PageRequest {
            page: 1,
            per_page: 100
        }
    );
}
