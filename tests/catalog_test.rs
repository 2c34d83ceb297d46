use jobfair_backend::error::Error;
use jobfair_backend::services::catalog_service::{
    import_vacancies, normalize, split_lines, ImportFormat, DEFAULT_JOB_TYPE,
};
use jobfair_backend::utils::delimited;
use serde_json::json;

#[test]
fn normalizing_twice_changes_nothing() {
    let inputs = [
        json!({}),
        json!({"title": "  Dev  ", "tags": "React, Tailwind, UI", "requirements": "A\nB;C"}),
        json!({"id": "7", "type": "Internship", "tags": ["x", "y"], "applyLink": " https://x.test/apply "}),
        json!({"responsibilities": ["Ship", "Review"], "company": " Co "}),
    ];
    for raw in inputs {
        let once = normalize(&raw);
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice, "{raw}");
    }
}

#[test]
fn tags_split_on_commas() {
    let v = normalize(&json!({"tags": "React, Tailwind, UI"}));
    assert_eq!(v.tags, vec!["React", "Tailwind", "UI"]);
}

#[test]
fn lists_split_on_semicolon_or_newline() {
    assert_eq!(split_lines("A\nB;C"), vec!["A", "B", "C"]);
    let v = normalize(&json!({"responsibilities": "A\nB;C", "requirements": " ; \n"}));
    assert_eq!(v.responsibilities, vec!["A", "B", "C"]);
    assert!(v.requirements.is_empty());
}

#[test]
fn csv_row_becomes_a_vacancy() {
    let csv = "id,title,company,location,type,tags,description,responsibilities,requirements\n\
               1,Dev,Co,City,Full-time,\"JS,TS\",desc,Do A;Do B,Need X;Need Y\n";
    let rows = delimited::parse(csv);
    assert_eq!(rows.len(), 1);

    let v = jobfair_backend::services::catalog_service::normalize_row(&rows[0]);
    assert_eq!(v.id, "1");
    assert_eq!(v.title, "Dev");
    assert_eq!(v.company, "Co");
    assert_eq!(v.location, "City");
    assert_eq!(v.job_type, DEFAULT_JOB_TYPE);
    assert_eq!(v.tags, vec!["JS", "TS"]);
    assert_eq!(v.description, "desc");
    assert_eq!(v.responsibilities, vec!["Do A", "Do B"]);
    assert_eq!(v.requirements, vec!["Need X", "Need Y"]);
    assert_eq!(v.apply_link, None);
}

#[test]
fn json_import_accepts_array_or_jobs_object() {
    let array = import_vacancies(r#"[{"title": "A"}, {"title": "B"}]"#, ImportFormat::Json).unwrap();
    assert_eq!(array.len(), 2);

    let wrapped = import_vacancies(r#"{"jobs": [{"title": "C", "tags": "x,y"}]}"#, ImportFormat::Json).unwrap();
    assert_eq!(wrapped[0].title, "C");
    assert_eq!(wrapped[0].tags, vec!["x", "y"]);
}

#[test]
fn bad_imports_fail_without_partial_results() {
    match import_vacancies("{oops", ImportFormat::Json) {
        Err(Error::Parse(msg)) => assert_eq!(msg, "Could not import the file. Please check format."),
        other => panic!("unexpected: {other:?}"),
    }
    match import_vacancies(r#"{"vacancies": []}"#, ImportFormat::Json) {
        Err(Error::Parse(msg)) => assert_eq!(msg, "No valid jobs found in file."),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(
        import_vacancies("id,title\n", ImportFormat::Csv),
        Err(Error::Parse(_))
    ));
}

#[test]
fn doubled_quotes_are_not_unescaped_on_import() {
    let rows = delimited::parse("title,description\nDev,\"say \"\"hi\"\"\"\n");
    assert_eq!(rows[0]["description"], "say hi");
}
