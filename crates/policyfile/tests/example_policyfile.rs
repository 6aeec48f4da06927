//! The reference Policyfile for a managed Chef server deployment.

use policyfile::{
    parse, render, AttributeValue, ConstraintOperator, Error, SourceDescriptor, DEFAULT_RUN_LIST,
};

const EXAMPLE: &str = include_str!("fixtures/Policyfile.rb");

#[test]
fn example_document_fields() {
    let doc = parse(EXAMPLE).unwrap();

    assert_eq!(doc.name, "default");
    assert_eq!(
        doc.default_source,
        vec![SourceDescriptor::Supermarket { url: None }]
    );

    assert_eq!(doc.dependencies.len(), 1);
    let dep = &doc.dependencies[0];
    assert_eq!(dep.name, "managed_chef_server");
    let constraint = dep.constraint.as_ref().unwrap();
    assert!(constraint.is_exact());
    assert_eq!(constraint.operator, ConstraintOperator::Eq);
    assert_eq!(constraint.version, "0.18.1");

    let names: Vec<_> = doc.run_lists.keys().map(String::as_str).collect();
    assert_eq!(names, [DEFAULT_RUN_LIST, "install", "upgrade"]);
    assert_eq!(
        doc.run_list("default").unwrap(),
        [
            "managed_chef_server::default",
            "managed_chef_server::managed_organization"
        ]
    );
    assert_eq!(
        doc.run_list("install").unwrap(),
        ["managed_chef_server::default"]
    );
    assert_eq!(
        doc.run_list("upgrade").unwrap(),
        ["managed_chef_server::upgrade"]
    );
}

#[test]
fn example_document_attributes() {
    let doc = parse(EXAMPLE).unwrap();

    assert_eq!(
        doc.attribute("chef-server.accept_license").unwrap(),
        &AttributeValue::Bool(true)
    );
    assert_eq!(
        doc.attribute("mcs.org.name").unwrap(),
        &AttributeValue::String("example".into())
    );
    assert_eq!(
        doc.attribute(["mcs", "org", "full_name"].as_slice())
            .unwrap()
            .as_str(),
        Some("Your Chef Managed Organization")
    );
    assert_eq!(
        doc.attribute("mcs.managed_user.email").unwrap().as_str(),
        Some("you@example.com")
    );

    let flattened: Vec<_> = doc
        .flatten_attributes()
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(
        flattened,
        [
            "chef-server.accept_license",
            "mcs.managed_user.email",
            "mcs.org.full_name",
            "mcs.org.name",
        ]
    );
}

#[test]
fn example_lookup_miss_is_reported_not_fatal() {
    let doc = parse(EXAMPLE).unwrap();

    assert_eq!(
        doc.attribute("mcs.org.id").unwrap_err(),
        Error::UnknownAttributePath {
            path: "mcs.org.id".to_string()
        }
    );
    assert!(doc.get_attribute("chef-server.accept_license.extra").is_none());
    assert!(doc.get_attribute("").is_none());
    // The document is still usable after a miss.
    assert!(doc.attribute("mcs.org.name").is_ok());
}

#[test]
fn example_parses_identically_twice() {
    assert_eq!(parse(EXAMPLE).unwrap(), parse(EXAMPLE).unwrap());
}

#[test]
fn example_survives_render() {
    let doc = parse(EXAMPLE).unwrap();
    assert_eq!(parse(&render(&doc)).unwrap(), doc);
}

#[test]
fn example_with_duplicate_cookbook() {
    let input = format!("{EXAMPLE}\ncookbook 'managed_chef_server'\n");
    assert!(matches!(
        parse(&input),
        Err(Error::DuplicateDependency { ref name, .. }) if name == "managed_chef_server"
    ));
}

#[test]
fn example_with_empty_named_run_list() {
    let input = format!("{EXAMPLE}\nnamed_run_list :rollback\n");
    assert!(matches!(
        parse(&input),
        Err(Error::EmptyRunList { ref name, .. }) if name == "rollback"
    ));
}

#[test]
fn example_without_name() {
    let input: String = EXAMPLE
        .lines()
        .filter(|line| !line.starts_with("name "))
        .map(|line| format!("{line}\n"))
        .collect();
    assert!(matches!(
        parse(&input),
        Err(Error::MalformedDocument { .. })
    ));
}
