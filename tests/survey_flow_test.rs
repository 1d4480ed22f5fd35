use std::sync::Arc;
use surveyor::domain::{
    Field, FieldDefaults, FieldOption, FieldPatch, FieldType, FieldValue, OptionSet, OptionSetKind, Section,
    Subsection, SurveyConfig,
};
use surveyor::form::{FormSession, InputEvent, RenderedControl, SubmissionError};
use surveyor::persistence::InMemoryStore;
use surveyor::resolver::{InMemoryOptionSetCache, OptionSetCache, OptionSetLoader};

fn new_cache() -> Arc<dyn OptionSetCache> {
    Arc::new(InMemoryOptionSetCache::new())
}

async fn store_with_rating_scale() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store
        .insert_option_set(OptionSet::new(OptionSetKind::Rating, "rs1", "Agreement").with_options(vec![
            FieldOption::new("Low", "Low"),
            FieldOption::new("Medium", "Medium").as_default(),
            FieldOption::new("High", "High"),
        ]))
        .await;
    Arc::new(store)
}

#[tokio::test]
async fn test_admin_builds_and_respondent_submits() -> anyhow::Result<()> {
    let mut survey = SurveyConfig::new("Customer feedback");
    let section = survey.add_section("About Us");
    section.defaults = Some(FieldDefaults::for_type(FieldType::Email));
    let email_id = {
        let field = section.add_field("Email Address");
        field.required = true;
        field.id.clone()
    };
    assert_eq!(section.section_type, "about-us-identifier");

    let store = InMemoryStore::new();
    let mut session = FormSession::new(survey, new_cache());

    let rendered = session.render_field(&email_id).unwrap();
    assert!(matches!(rendered.control, RenderedControl::TextInput { .. }));

    let err = session.submit("i1", &store).await.unwrap_err();
    match err {
        SubmissionError::Validation(errors) => {
            assert_eq!(errors.get(&email_id), Some("This field is required"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
    assert_eq!(session.store().error(&email_id), Some("This field is required"));

    session.handle_input(&email_id, InputEvent::Text("not-an-email".into()))?;
    assert!(session.store().error(&email_id).is_none());
    assert!(session.submit("i1", &store).await.is_err());

    session.handle_input(&email_id, InputEvent::Text("ada@example.com".into()))?;
    let receipt = session.submit("i1", &store).await?;
    assert_eq!(receipt.response_count, 1);

    let stored = store.responses_for("i1").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].responses.get("about_us_email_address"),
        Some(&FieldValue::text("ada@example.com"))
    );
    assert!(session.store().errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_late_rating_scale_default() -> anyhow::Result<()> {
    let survey = SurveyConfig::with_id("c1", "Pulse").with_section(
        Section::new("s1", "Mood", 0)
            .with_field(Field::new("today", FieldType::Rating, "Today").with_option_set("rs1"))
            .with_field(Field::new("week", FieldType::Rating, "This week").with_option_set("rs1")),
    );
    let backend = store_with_rating_scale().await;
    let mut session = FormSession::new(survey, new_cache());

    // The respondent answers one field before the scale arrives.
    session.handle_input("week", InputEvent::Select("High".into()))?;
    assert_eq!(session.store().get_value("today"), None);

    for handle in session.spawn_option_set_loads(&OptionSetLoader::new(backend.clone())) {
        handle.await?;
    }
    assert_eq!(session.sync_option_defaults(), 1);
    assert_eq!(session.store().get_value("today"), Some(&FieldValue::text("Medium")));
    assert_eq!(session.store().get_value("week"), Some(&FieldValue::text("High")));

    // Applied once: a second sync never re-seeds a cleared value.
    session.handle_input("today", InputEvent::Clear)?;
    assert_eq!(session.sync_option_defaults(), 0);

    match session.render_field("week").unwrap().control {
        RenderedControl::RatingDropdown { options, selected } => {
            assert_eq!(options.len(), 3);
            assert_eq!(selected.as_deref(), Some("High"));
        }
        other => panic!("Expected rating dropdown, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_rating_field_renders_loading_while_fetching() -> anyhow::Result<()> {
    let survey = SurveyConfig::with_id("c1", "Pulse").with_section(
        Section::new("s1", "Mood", 0)
            .with_field(Field::new("today", FieldType::Rating, "Today").with_option_set("rs1")),
    );
    let loader = OptionSetLoader::new(store_with_rating_scale().await);
    let mut session = FormSession::new(survey, new_cache());

    let handles = session.spawn_option_set_loads(&loader);
    assert_eq!(session.render_field("today").unwrap().control, RenderedControl::Loading);

    for handle in handles {
        handle.await?;
    }
    session.sync_option_defaults();
    match session.render_field("today").unwrap().control {
        RenderedControl::RatingDropdown { options, selected } => {
            assert_eq!(options.len(), 3);
            assert_eq!(selected.as_deref(), Some("Medium"));
        }
        other => panic!("Expected rating dropdown, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_torn_down_session_ignores_late_fetch() {
    let survey = SurveyConfig::with_id("c1", "Pulse").with_section(
        Section::new("s1", "Mood", 0)
            .with_field(Field::new("today", FieldType::Rating, "Today").with_option_set("rs1")),
    );
    let loader = OptionSetLoader::new(store_with_rating_scale().await);
    let cache = new_cache();
    let weak = Arc::downgrade(&cache);
    let session = FormSession::new(survey, cache);

    let refs = session.option_set_refs();
    drop(session);

    for key in refs {
        assert_eq!(
            loader.load(weak.clone(), key).await,
            surveyor::resolver::LoadOutcome::Discarded
        );
    }
}

#[test]
fn test_subsection_defaults_win_over_section() {
    let mut section = Section::new("s1", "Preferences", 0)
        .with_defaults(FieldDefaults::for_type(FieldType::Radio))
        .with_subsection(Subsection::new("sub1", "Colours").with_defaults(FieldDefaults::for_type(FieldType::MultiSelect)));

    let field_type = section
        .add_subsection_field("sub1", "Favourite colours")
        .map(|f| f.field_type.clone());
    assert_eq!(field_type, Some(FieldType::MultiSelect));

    assert_eq!(section.add_field("Pick one").field_type, FieldType::Radio);
}

#[test]
fn test_label_history_on_rename() {
    let mut survey = SurveyConfig::with_id("c1", "Survey")
        .with_section(Section::new("s1", "About", 0).with_field(Field::new("f1", FieldType::Text, "Name")));

    let patch = FieldPatch {
        label: Some("Full name".into()),
        ..Default::default()
    };
    assert!(survey.update_field("f1", patch, "alice"));

    let field = survey.find_field("f1").unwrap();
    assert_eq!(field.label, "Full name");
    assert_eq!(field.label_history.len(), 1);
    assert_eq!(field.label_history[0].label, "Name");
    assert_eq!(field.label_history[0].changed_by, "alice");
}

#[tokio::test]
async fn test_multiselect_toggle_and_submit_list() -> anyhow::Result<()> {
    let survey = SurveyConfig::with_id("c1", "Survey").with_section(
        Section::new("s1", "Interests", 0).with_field(
            Field::new("topics", FieldType::MultiSelectDropdown, "Topics").with_options(vec![
                FieldOption::new("Rust", "rust"),
                FieldOption::new("Go", "go"),
                FieldOption::new("Zig", "zig"),
            ]),
        ),
    );
    let store = InMemoryStore::new();
    let mut session = FormSession::new(survey, new_cache());
    assert_eq!(session.store().get_value("topics"), Some(&FieldValue::List(vec![])));

    for value in ["zig", "rust", "go", "rust"] {
        session.handle_input("topics", InputEvent::Toggle(value.into()))?;
    }
    assert_eq!(
        session.store().get_value("topics"),
        Some(&FieldValue::List(vec!["zig".into(), "go".into()]))
    );

    session.submit("i1", &store).await?;
    let stored = store.responses_for("i1").await;
    assert_eq!(
        stored[0].responses.get("interests_topics"),
        Some(&FieldValue::List(vec!["zig".into(), "go".into()]))
    );
    Ok(())
}
