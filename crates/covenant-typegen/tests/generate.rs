use covenant_http::{handler, ContractRequest, ContractResponse, HandlerResult, RouteOptions, Router, RouterConfig, RouterError};
use covenant_openapi::{BaseProperties, RequestSchema, RouteSchema};
use covenant_schema::{array, enumeration, integer, named, object_with_only, one_of, string, string_enum};
use covenant_typegen::cli::{execute, Args, Outcome};
use covenant_typegen::{generate_types, TypeEmitter, TypeScriptEmitter, TypegenError, INDEX_FILE};
use git2::{IndexAddOption, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

async fn update_something(_request: ContractRequest) -> HandlerResult {
    Ok(ContractResponse::created(serde_json::json!({ "id": 1 })))
}

fn mount() -> Result<Router, RouterError> {
    let schema = RouteSchema::new()
        .request(
            RequestSchema::new()
                .query(object_with_only([
                    (
                        "hello",
                        string_enum(["hi", "hello"]).describe("Different ways to greet someone"),
                    ),
                    ("foo", array(string()).optional()),
                ]))
                .params(object_with_only([("id", integer().parse())]))
                .body(object_with_only([("action", enumeration(["create", "update"]))])),
        )
        .response(
            201,
            object_with_only([
                ("id", integer()),
                (
                    "item",
                    one_of([
                        named("itemA", object_with_only([("id", integer())])),
                        named("itemB", object_with_only([("id", integer())])),
                    ])
                    .optional(),
                ),
            ]),
        );

    let mut router =
        Router::new(RouterConfig::new().swagger_base_properties(BaseProperties::new("My api", "1.0.0")));
    router.put(
        RouteOptions::new("/api/something/:id")
            .operation_id("updateSomething")
            .summary("This route is about something")
            .schema(schema)
            .handler(handler(update_something))
            .public(),
    )?;
    Ok(router)
}

fn commit_all(repo: &Repository) {
    let mut index = repo.index().unwrap();
    index.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("covenant", "covenant@localhost").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, "contract", &tree, &parents)
        .unwrap();
}

fn contract_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let contract = dir.path().join("contract/src");
    fs::create_dir_all(&contract).unwrap();
    fs::write(contract.join("server.ts"), "// placeholder\n").unwrap();
    fs::write(
        dir.path().join("contract/package.json"),
        "{\n  \"name\": \"contract\",\n  \"version\": \"1.0.0\"\n}\n",
    )
    .unwrap();
    commit_all(&repo);
    (dir, repo)
}

fn args(contract_path: &Path) -> Args {
    Args {
        contract_path: contract_path.to_path_buf(),
        contract_dir: None,
        ci: false,
        yes: false,
        emitter: None,
    }
}

#[test]
fn emits_typescript_interfaces() {
    let document = mount().unwrap().to_openapi();
    let module = TypeScriptEmitter::new().emit(&document).unwrap();

    for expected in [
        "export interface paths {\n  \"/api/something/{id}\": {\n    /** This route is about something */\n    put: operations[\"updateSomething\"];\n  };\n}",
        "    itemA: {\n      id: number;\n    };",
        "        /** Different ways to greet someone */\n        hello: \"hi\" | \"hello\";",
        "        foo?: string[];",
        "        id: number;",
        "        \"application/json\": {\n          action: \"create\" | \"update\";\n        };",
        "            item?: components[\"schemas\"][\"itemA\"] | components[\"schemas\"][\"itemB\"];",
    ] {
        assert!(module.contains(expected), "missing:\n{}\n\nin:\n{}", expected, module);
    }
}

#[test]
fn writes_contract_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("contract");

    let generated = generate_types(mount, &out, &TypeScriptEmitter::new()).unwrap();
    assert_eq!(generated.written.len(), 2);
    assert!(generated.document.paths.contains_key("/api/something/{id}"));
    assert!(fs::read_to_string(out.join("server.ts"))
        .unwrap()
        .contains("export interface operations"));
    assert!(fs::read_to_string(out.join(INDEX_FILE))
        .unwrap()
        .contains("from './server'"));

    let again = generate_types(mount, &out, &TypeScriptEmitter::new()).unwrap();
    assert!(again.written.is_empty());
}

#[test]
fn mount_failures_are_reported() {
    let dir = TempDir::new().unwrap();
    let result = generate_types(
        || Err(RouterError::invalid_path("api")),
        dir.path(),
        &TypeScriptEmitter::new(),
    );
    assert!(matches!(result, Err(TypegenError::Mount(_))));
}

#[test]
fn ci_mode_fails_on_changes() {
    let (dir, _repo) = contract_repo();
    let args = Args {
        ci: true,
        ..args(&dir.path().join("contract/src"))
    };

    let outcome = execute(&args, mount).unwrap();
    assert_eq!(outcome, Outcome::Changed { bump: None });
    assert!(outcome.fails(args.ci));
    assert!(fs::read_to_string(dir.path().join("contract/package.json"))
        .unwrap()
        .contains("\"1.0.0\""));
}

#[test]
fn changes_bump_the_contract_version() {
    let (dir, repo) = contract_repo();
    let args = Args {
        yes: true,
        ..args(&dir.path().join("contract/src"))
    };

    let outcome = execute(&args, mount).unwrap();
    let Outcome::Changed { bump: Some(bump) } = &outcome else {
        panic!("expected a version bump, got {:?}", outcome);
    };
    assert_eq!(bump.previous, "1.0.0");
    assert_eq!(bump.current, "1.0.1");

    commit_all(&repo);
    let outcome = execute(&args, mount).unwrap();
    assert_eq!(outcome, Outcome::Unchanged);
    assert!(!outcome.fails(true));
}
