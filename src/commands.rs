//! CLI command handlers.

use anyhow::bail;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cli::{Cli, Command};
use crate::config::validator::ConfigValidator;
use crate::config::{read_document, Settings};
use crate::domain::slug::descriptive_key;
use crate::domain::{FieldPatch, FieldValue, SurveyConfig};
use crate::form::{FormSession, SubmissionError};
use crate::persistence::InMemoryStore;
use crate::resolver::{InMemoryOptionSetCache, LoadOutcome, OptionSetCache, OptionSetLoader};
use crate::transfer::{restore_value, schema_json, to_json_string};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::new_with_cli(&cli)?;

    match cli.command {
        Command::Check { file } => check(&settings, &file),
        Command::Normalize { file, output } => {
            let survey = load_survey(&file)?;
            write_output(output.as_deref(), &to_json_string(&survey)?)
        }
        Command::Keys { file } => keys(&file),
        Command::Relabel {
            file,
            field_id,
            label,
            output,
        } => relabel(&settings, &file, &field_id, label, output.as_deref()),
        Command::Submit {
            file,
            answers,
            instance_id,
        } => submit(&settings, &file, &answers, &instance_id).await,
        Command::Schema => {
            println!("{}", schema_json()?);
            Ok(())
        }
        Command::List => list(&settings),
    }
}

fn load_survey(path: &Path) -> anyhow::Result<SurveyConfig> {
    let doc = read_document(path)?;
    restore_value(doc).map_err(|e| {
        for problem in &e.problems {
            error!("{}: {}", path.display(), problem);
        }
        anyhow::anyhow!("{} rejected with {} problem(s)", path.display(), e.problems.len())
    })
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn check(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let survey = load_survey(file)?;

    let sets = settings.load_option_sets()?;
    let known: Option<HashSet<_>> = if sets.is_empty() {
        None
    } else {
        Some(sets.iter().map(|s| s.reference()).collect())
    };

    if let Err(errors) = ConfigValidator::validate_survey(&survey, known.as_ref()) {
        for e in &errors {
            error!("{}: {}", file.display(), e);
        }
        bail!("{} has {} problem(s)", file.display(), errors.len());
    }

    println!(
        "{}: OK ({} sections, {} fields)",
        file.display(),
        survey.sections.len(),
        survey.field_count()
    );
    Ok(())
}

fn keys(file: &Path) -> anyhow::Result<()> {
    let survey = load_survey(file)?;
    let mut owners: HashMap<String, Vec<String>> = HashMap::new();

    for (section, field) in survey.fields_in_order() {
        let key = descriptive_key(&section.title, &field.label);
        println!("{}\t{}", key, field.id);
        owners.entry(key).or_default().push(field.id.clone());
    }

    for (key, ids) in owners.iter().filter(|(_, ids)| ids.len() > 1) {
        warn!("Key '{}' is shared by fields {}; the last one wins", key, ids.join(", "));
    }
    Ok(())
}

fn relabel(
    settings: &Settings,
    file: &Path,
    field_id: &str,
    label: String,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut survey = load_survey(file)?;
    if survey.find_field(field_id).is_none() {
        bail!("No field '{}' in {}", field_id, file.display());
    }

    let patch = FieldPatch {
        label: Some(label),
        ..Default::default()
    };
    if survey.update_field(field_id, patch, &settings.form.changed_by) {
        info!("Relabelled field {} (by {})", field_id, settings.form.changed_by);
    } else {
        info!("Field {} already has that label", field_id);
    }

    write_output(output, &to_json_string(&survey)?)
}

async fn submit(settings: &Settings, file: &Path, answers: &Path, instance_id: &str) -> anyhow::Result<()> {
    let survey = load_survey(file)?;
    let answers: BTreeMap<String, FieldValue> = serde_json::from_value(read_document(answers)?)?;

    let store = Arc::new(InMemoryStore::new());
    for set in settings.load_option_sets()? {
        store.insert_option_set(set).await;
    }

    let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
    let mut session = FormSession::new(survey, cache);
    let loader = OptionSetLoader::new(store.clone());
    for outcome in session.load_option_sets(&loader).await {
        if let LoadOutcome::Failed(e) = outcome {
            warn!("{}", e);
        }
    }

    for (field_id, value) in answers {
        if let Err(e) = session.set_value(&field_id, value) {
            warn!("Ignoring answer: {}", e);
        }
    }

    match session.submit(instance_id, store.as_ref()).await {
        Ok(receipt) => {
            let stored = store.responses_for(&receipt.instance_id).await;
            if let Some(latest) = stored.last() {
                println!("{}", serde_json::to_string_pretty(&latest.responses)?);
            }
            Ok(())
        }
        Err(SubmissionError::Validation(errors)) => {
            for e in errors.iter() {
                error!("{}: {}", e.field_id, e.message);
            }
            bail!("Submission rejected: {}", errors);
        }
        Err(e) => Err(e.into()),
    }
}

fn list(settings: &Settings) -> anyhow::Result<()> {
    for survey in settings.load_surveys()? {
        println!(
            "{}\t{}\t{} sections\t{} fields",
            survey.id,
            survey.title,
            survey.sections.len(),
            survey.field_count()
        );
    }
    Ok(())
}
