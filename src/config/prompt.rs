use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

pub const SYSTEM_PROMPT: &str =
    "Eres RUFO, el asistente de análisis de datos de OEFA (Organismo de Evaluación y Fiscalización Ambiental del Perú).
Tu función es ayudar a los usuarios a entender e interpretar los datos de los tableros de Power BI de OEFA.

INSTRUCCIONES:
- Responde SIEMPRE en español, de forma clara y concisa.
- Basa tus respuestas en los datos del tablero que se te proporcionan.
- Si los datos no contienen información suficiente, indícalo claramente.
- Puedes hacer cálculos simples, identificar tendencias y comparaciones.
- No inventes datos que no estén en el contexto proporcionado.
- Sé amigable y profesional, acorde a la imagen institucional de OEFA.";

pub const VISION_INSTRUCTIONS: &str =
    "- Cuando recibas una imagen del tablero, describe primero los elementos visibles (cifras, gráficos, tablas) y luego ofrece tu análisis.";

pub const CONTEXT_LABEL: &str = "DATOS ACTUALES DEL TABLERO:";

#[derive(Debug)]
pub enum PromptError {
    EmptyTemplate(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::EmptyTemplate(key) => write!(f, "Prompt template '{}' is empty", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

fn default_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

fn default_vision_instructions() -> String {
    VISION_INSTRUCTIONS.to_string()
}

fn default_context_label() -> String {
    CONTEXT_LABEL.to_string()
}

/// Texts used to build the provider's system instructions. Every field can be
/// overridden from a JSON file; missing fields keep the built-in wording.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_vision_instructions")]
    pub vision_instructions: String,
    #[serde(default = "default_context_label")]
    pub context_label: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            vision_instructions: default_vision_instructions(),
            context_label: default_context_label(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("system_prompt".to_string()));
        }
        if self.context_label.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("context_label".to_string()));
        }
        Ok(())
    }

    /// Builds the system text for one call.
    ///
    /// Image calls get the vision instruction appended to the preamble. A
    /// non-empty dashboard context is added as a labelled block at the end;
    /// an empty one leaves the preamble untouched.
    pub fn system_prompt_for(&self, dashboard_context: &str, with_image: bool) -> String {
        let mut system = self.system_prompt.clone();

        if with_image && !self.vision_instructions.is_empty() {
            system.push('\n');
            system.push_str(&self.vision_instructions);
        }

        if !dashboard_context.is_empty() {
            system.push_str("\n\n");
            system.push_str(&self.context_label);
            system.push('\n');
            system.push_str(dashboard_context);
        }

        system
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompt overrides from '{}'", path.as_ref().display());
    Ok(Arc::new(config))
}
