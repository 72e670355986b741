// src/services/catalog.rs

use std::{fmt, fs, path::Path};

use rand::Rng;

use crate::{
    error::AppError,
    models::challenge::{AgeGroup, ChallengeTemplate, ChallengeType},
};

#[derive(Debug)]
pub enum CatalogError {
    /// The unfiltered bank has no templates.
    EmptyCatalog,
    InvalidTemplate { index: usize, reason: String },
    Io(String),
    Parse(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::EmptyCatalog => write!(f, "challenge catalog is empty"),
            CatalogError::InvalidTemplate { index, reason } => {
                write!(f, "challenge template #{} is invalid: {}", index, reason)
            }
            CatalogError::Io(msg) => write!(f, "cannot read challenge catalog: {}", msg),
            CatalogError::Parse(msg) => write!(f, "cannot parse challenge catalog: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// The static pool of challenge templates, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ChallengeCatalog {
    templates: Vec<ChallengeTemplate>,
}

impl ChallengeCatalog {
    pub fn new(templates: Vec<ChallengeTemplate>) -> Result<Self, CatalogError> {
        if templates.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        for (index, template) in templates.iter().enumerate() {
            template.check().map_err(|e| CatalogError::InvalidTemplate {
                index,
                reason: e.to_string(),
            })?;
        }
        Ok(Self { templates })
    }

    /// Loads a JSON array of templates.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|e| CatalogError::Io(e.to_string()))?;
        let templates: Vec<ChallengeTemplate> =
            serde_json::from_str(&raw).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(templates)
    }

    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Draws one template uniformly at random.
    ///
    /// `challenge_type` restricts the pool; `age_group` narrows it further only when at least
    /// one matching template exists. An unmatched type filter falls back to the whole bank.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        challenge_type: Option<ChallengeType>,
        age_group: Option<AgeGroup>,
    ) -> &ChallengeTemplate {
        let all: Vec<&ChallengeTemplate> = self.templates.iter().collect();

        let mut pool: Vec<&ChallengeTemplate> = match challenge_type {
            Some(t) => all.iter().copied().filter(|c| c.challenge_type == t).collect(),
            None => all.clone(),
        };
        if pool.is_empty() {
            tracing::warn!(
                "No templates of type {:?}, drawing from the whole catalog",
                challenge_type
            );
            pool = all;
        }

        if let Some(age) = age_group {
            let narrowed: Vec<&ChallengeTemplate> = pool
                .iter()
                .copied()
                .filter(|c| c.age_group == Some(age))
                .collect();
            if !narrowed.is_empty() {
                pool = narrowed;
            }
        }

        pool[rng.random_range(0..pool.len())]
    }
}

fn template(
    challenge_type: ChallengeType,
    age_group: AgeGroup,
    question: &str,
    options: &[&str],
    correct_answer: i32,
) -> ChallengeTemplate {
    ChallengeTemplate {
        challenge_type,
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        age_group: Some(age_group),
    }
}

fn builtin_templates() -> Vec<ChallengeTemplate> {
    use AgeGroup::{EightToTen, ElevenToThirteen, FourteenToFifteen, SixToSeven};
    use ChallengeType::{Math, Reading};

    vec![
        template(Math, EightToTen, "¿Cuánto es 12 + 8?", &["18", "20", "22", "24"], 1),
        template(
            Math,
            SixToSeven,
            "Si tienes 5 manzanas y compras 3 más, ¿cuántas tienes en total?",
            &["6", "7", "8", "9"],
            2,
        ),
        template(Math, SixToSeven, "¿Cuánto es 7 × 3?", &["18", "21", "24", "28"], 1),
        template(
            Math,
            EightToTen,
            "Un libro cuesta 15 000 pesos y pagas con 20 000. ¿Cuánto te devuelven?",
            &["3 000", "5 000", "7 000", "15 000"],
            1,
        ),
        template(
            Math,
            ElevenToThirteen,
            "¿Cuál es el 25 % de 80?",
            &["15", "20", "25", "40"],
            1,
        ),
        template(
            Math,
            ElevenToThirteen,
            "Si 3x = 27, ¿cuánto vale x?",
            &["6", "8", "9", "24"],
            2,
        ),
        template(
            Math,
            FourteenToFifteen,
            "¿Cuál es la pendiente de la recta y = 4x − 2?",
            &["−2", "2", "4", "−4"],
            2,
        ),
        template(
            Math,
            FourteenToFifteen,
            "Un triángulo rectángulo tiene catetos de 6 y 8. ¿Cuánto mide la hipotenusa?",
            &["10", "12", "14", "48"],
            0,
        ),
        template(
            Reading,
            SixToSeven,
            "María leyó un cuento sobre un gato que ayudaba a otros animales. ¿Qué palabra describe mejor al gato?",
            &["Egoísta", "Amable", "Travieso", "Dormilón"],
            1,
        ),
        template(
            Reading,
            EightToTen,
            "Pedro llegó tarde a la escuela porque se quedó dormido. ¿Cuál es la causa de que llegara tarde?",
            &["La escuela está lejos", "Se quedó dormido", "Perdió el bus", "No tenía reloj"],
            1,
        ),
        template(
            Reading,
            EightToTen,
            "\"El río creció tanto que el puente quedó bajo el agua.\" ¿Qué pasó con el puente?",
            &["Se rompió", "Quedó cubierto por el agua", "Lo pintaron", "Se movió de lugar"],
            1,
        ),
        template(
            Reading,
            ElevenToThirteen,
            "En un texto que dice \"Sin embargo, no todos estaban de acuerdo\", ¿qué indica \"sin embargo\"?",
            &["Una causa", "Una oposición", "Un ejemplo", "Una conclusión"],
            1,
        ),
        template(
            Reading,
            ElevenToThirteen,
            "¿Cuál es el propósito principal de un texto instructivo?",
            &["Entretener", "Explicar cómo hacer algo", "Narrar una historia", "Expresar sentimientos"],
            1,
        ),
        template(
            Reading,
            FourteenToFifteen,
            "Un columnista afirma que \"todos los jóvenes odian leer\" sin dar datos. ¿Qué falla tiene el argumento?",
            &[
                "Es una generalización sin evidencia",
                "Usa demasiadas cifras",
                "Cita a expertos",
                "Es demasiado corto",
            ],
            0,
        ),
    ]
}
