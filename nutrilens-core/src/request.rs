//! Request builder: turns an [`AnalysisInput`] into a [`ContentPayload`].

use crate::error::AnalysisError;
use crate::input::AnalysisInput;
use crate::record::ProcessingLevel;
use crate::schema::OutputSchema;
use crate::types::{ContentPart, ContentPayload};

/// Label prefixed to the caller's text query
pub const QUERY_LABEL: &str = "Alimento para analisar:";

/// Instruction used when only an image is supplied
pub const IMAGE_ONLY_PROMPT: &str = "Analise nutricionalmente o alimento nesta imagem.";

/// Build the fixed system instruction.
pub fn system_instruction() -> String {
    let levels = ProcessingLevel::ALL
        .iter()
        .map(|level| format!("'{}'", level.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Você é um nutricionista e cientista de alimentos de classe mundial.\n\
         Analise o alimento fornecido (por imagem ou texto) e forneça um relatório nutricional completo.\n\
         - Se houver uma imagem, identifique os itens e estime as porções.\n\
         - Se houver texto, use os dados fornecidos.\n\
         - O 'healthScore' deve ser um inteiro de 0 a 100 baseado na densidade nutricional e nível de processamento.\n\
         - O campo 'processingLevel' deve ser exatamente um de: {}.\n\
         - Idioma: Português Brasileiro.",
        levels
    )
}

/// Assembles content payloads against a compiled output schema.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    schema: &'a OutputSchema,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(schema: &'a OutputSchema) -> Self {
        Self { schema }
    }

    /// Build the payload for one analysis.
    ///
    /// Part order: inline image first, then either the labelled query or the
    /// generic image prompt. Fails with a precondition error when neither
    /// image nor text is usable.
    pub fn build(&self, input: &AnalysisInput) -> Result<ContentPayload, AnalysisError> {
        let image = input.usable_image();
        let text = input.usable_text();

        let mut parts = Vec::with_capacity(2);

        if let Some(image) = image {
            parts.push(ContentPart::inline_data(&image.mime_type, &image.data));
        }

        match (text, image) {
            (Some(query), _) => parts.push(ContentPart::text(format!("{} {}", QUERY_LABEL, query))),
            (None, Some(_)) => parts.push(ContentPart::text(IMAGE_ONLY_PROMPT)),
            (None, None) => {
                return Err(AnalysisError::precondition(
                    "no image or text provided for analysis",
                ))
            }
        }

        Ok(ContentPayload {
            system_instruction: system_instruction(),
            parts,
            schema: self.schema.as_value().clone(),
        })
    }
}

/// Build a payload against the nutrition record schema.
pub fn build(input: &AnalysisInput) -> Result<ContentPayload, AnalysisError> {
    RequestBuilder::new(OutputSchema::nutrition()?).build(input)
}
