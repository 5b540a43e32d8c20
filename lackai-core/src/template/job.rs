use super::TemplateError;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Separator between template sections
pub const SECTION_SEPARATOR: &str = "\n---\n";

/// Fallback lookup for placeholders missing from the template data
pub type DataLoader = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([a-zA-Z0-9_]+)\}\}").expect("valid pattern"))
}

/// Prompt template split into a system section and one or more user sections.
///
/// Sections are separated by a line containing only `---`. A template with a
/// single section has an empty system prompt.
pub struct JobTemplate {
    source_name: String,
    sections: Vec<String>,
    data: BTreeMap<String, String>,
    loader: Option<DataLoader>,
}

impl JobTemplate {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(path.display().to_string(), &content))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        Self::parse("<inline>".to_string(), content)
    }

    fn parse(source_name: String, content: &str) -> Self {
        let mut sections: Vec<String> = content
            .split(SECTION_SEPARATOR)
            .map(str::to_string)
            .collect();
        if sections.len() < 2 {
            sections.insert(0, String::new());
        }
        Self {
            source_name,
            sections,
            data: BTreeMap::new(),
            loader: None,
        }
    }

    /// Replace the placeholder data.
    pub fn set_data<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_data(data);
        self
    }

    /// Install a lookup consulted for keys the data does not contain.
    pub fn set_data_loader<F>(&mut self, loader: F) -> &mut Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Number of user sections
    pub fn user_sections(&self) -> usize {
        self.sections.len() - 1
    }

    pub fn system_content(&self) -> Result<String, TemplateError> {
        self.render(0, "system")
    }

    /// Rendered user section `index` (zero-based)
    pub fn user_content(&self, index: usize) -> Result<String, TemplateError> {
        self.render(index + 1, &format!("user.{index}"))
    }

    fn render(&self, position: usize, section: &str) -> Result<String, TemplateError> {
        let template = self
            .sections
            .get(position)
            .ok_or_else(|| TemplateError::MissingSection {
                section: section.to_string(),
                source_name: self.source_name.clone(),
            })?;

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let key = &caps[1];
            out.push_str(&template[last..whole.start()]);
            out.push_str(&self.lookup(key, section)?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    fn lookup(&self, key: &str, section: &str) -> Result<String, TemplateError> {
        if let Some(value) = self.data.get(key) {
            return Ok(value.clone());
        }
        if let Some(value) = self.loader.as_ref().and_then(|load| load(key)) {
            return Ok(value);
        }
        Err(TemplateError::MissingKey {
            key: key.to_string(),
            section: section.to_string(),
            source_name: self.source_name.clone(),
        })
    }
}

impl fmt::Debug for JobTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobTemplate")
            .field("source_name", &self.source_name)
            .field("sections", &self.sections.len())
            .field("data", &self.data)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}
