//! `shadowpilot inspect`: show what the observer reads from a page.

use std::path::Path;

use shadowpilot_config::Config;
use shadowpilot_observer::{PageDocument, PageObserver};

pub(crate) fn run(
    config: &Config,
    page_path: &Path,
    focus: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = PageDocument::from_json(&std::fs::read_to_string(page_path)?)?;
    let observer = PageObserver::new(config.observer.clone())?;

    println!("url:       {}", document.url());
    println!("title:     {}", document.title());
    println!(
        "header:    {}",
        observer.page_header(&document).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "connector: {}",
        observer
            .guess_connector(&document)
            .unwrap_or_else(|| "-".to_string())
    );

    if let Some(selector) = focus {
        match document.query(selector)? {
            Some(id) => {
                let label = observer.resolve_label(&document, id);
                println!("label:     {}", label.as_deref().unwrap_or("-"));
                println!("value:     {}", observer.control_value(&document, id));
                println!("field:     {}", observer.focus_signal(&document, id).is_some());
            }
            None => println!("focus:     no element matches '{}'", selector),
        }
    }

    println!();
    println!("{}", observer.extract_snippet(&document));
    Ok(())
}
