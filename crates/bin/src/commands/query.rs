//! Read-only queries over a loaded store.

use ensemble::{
    ElementKey, Path, Store, View,
    merge::{Condition, Origin},
};

use crate::cli::{GetArgs, KeysArgs, ListArgs, PathsArgs, WhichArgs};
use crate::output::{OutputFormat, print_keys, print_table};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn element_key(store: &Store, text: &str) -> Result<ElementKey, Box<dyn std::error::Error>> {
    ElementKey::parse_for(store.kind(), text)
        .ok_or_else(|| format!("'{text}' is not a valid index for a {} store", store.kind()).into())
}

fn view(raw: bool) -> View {
    if raw { View::Raw } else { View::Effective }
}

fn origin_label(origin: Origin) -> String {
    match origin {
        Origin::Raw => "raw".to_string(),
        Origin::Default { rule } => format!("default #{rule}"),
    }
}

/// Run the `list` command
pub fn list(store: &Store, args: &ListArgs, format: OutputFormat) -> CommandResult {
    let keys = store.list(args.include_empty);
    print_keys(&keys, Some("No elements found."), format)?;
    Ok(())
}

/// Run the `get` command
pub fn get(store: &Store, args: &GetArgs, format: OutputFormat) -> CommandResult {
    let key = element_key(store, &args.element)?;
    let path = Path::from(args.path.as_str());
    let value = store.value(&key, &path, view(args.raw))?;
    let origin = if args.origin {
        Some(store.origin(&key, &path)?)
    } else {
        None
    };

    match format {
        OutputFormat::Human => {
            println!("{value}");
            if let Some(origin) = origin {
                println!("origin: {}", origin_label(origin));
            }
        }
        OutputFormat::Json => match origin {
            Some(origin) => {
                let entry = serde_json::json!({
                    "value": value,
                    "origin": origin_label(origin),
                });
                println!("{}", serde_json::to_string(&entry)?);
            }
            None => println!("{}", serde_json::to_string(value)?),
        },
    }
    Ok(())
}

/// Run the `keys` command
pub fn keys(store: &Store, args: &KeysArgs, format: OutputFormat) -> CommandResult {
    let key = element_key(store, &args.element)?;
    let path = Path::from(args.path.as_str());
    let keys = store.keys(&key, &path, args.include_empty, view(args.raw))?;
    print_keys(&keys, None, format)?;
    Ok(())
}

/// Run the `which` command
pub fn which(store: &Store, args: &WhichArgs, format: OutputFormat) -> CommandResult {
    let conditions = args
        .conditions
        .iter()
        .map(|c| c.parse::<Condition>())
        .collect::<Result<Vec<_>, _>>()?;
    let keys = store.which(&conditions)?;
    print_keys(&keys, Some("No matching elements."), format)?;
    Ok(())
}

/// Run the `paths` command
pub fn paths(store: &Store, args: &PathsArgs, format: OutputFormat) -> CommandResult {
    let path = Path::from(args.path.as_str());
    let found = store.path_values(&path, args.include_empty)?;
    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = found
                .iter()
                .map(|(key, value)| vec![key.to_string(), value.to_string()])
                .collect();
            if rows.is_empty() {
                println!("No values at {path}.");
                return Ok(());
            }
            print_table(&["ELEMENT", "VALUE"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = found
                .iter()
                .map(|(key, value)| serde_json::json!({"element": key, "value": value}))
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}
