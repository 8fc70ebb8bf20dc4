//! Prompt construction for summaries, per-chunk extraction and term explanations.

/// Sentence the extraction prompt asks for when a chunk has nothing clinical in it.
pub const NO_MEDICAL_DATA: &str = "No medical data found in this section.";

/// Closing sentence every patient summary must end with.
pub const SUMMARY_DISCLAIMER: &str =
    "This summary is for informational purposes only and is not a diagnosis. Please consult your doctor.";

const PATIENT_SUMMARY_PREAMBLE: &str = "\
You are a helpful medical assistant. Your job is to summarize a medical report for a PATIENT (non-medical person).
RULES:
1. Language: Simple, clear, and reassuring. Avoid complex jargon.
2. Focus: Explain what the results mean, especially abnormal ones.
3. SAFETY: DO NOT diagnose, DO NOT prescribe, DO NOT say \"You have X disease\". Use \"This may indicate...\" or \"Commonly associated with...\".
4. Structure:
   - **Patient Overview**: Name, Age, Sex (if found), Tests performed.
   - **Key Findings**: List ONLY abnormal results (High/Low). Format: \"Test Name: Value (High/Low) - Simple Explanation\".
   - **What This Means**: A short paragraph explaining the overall picture.
   - **Next Steps**: Advise consulting a doctor.";

const CHUNK_EXTRACTION_PREAMBLE: &str = "\
You are a medical data extraction tool. Read the document section below and extract ONLY:
- Patient identifiers (name, age, sex, date of report)
- Test names with their values, units and reference ranges
IGNORE addresses, phone numbers, e-mail addresses, page footers, signatures and disclaimers.
Output a bullet list only. Do NOT add any diagnosis, interpretation or advice.";

/// Which task a prompt serves; decides the preamble and the framing of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTask {
    /// Safety-constrained narrative summary of a whole document.
    PatientSummary,
    /// Strict extraction of one chunk (`index` is zero-based).
    ChunkExtraction {
        /// Ordinal of the chunk.
        index: usize,
        /// Number of chunks in the document.
        total: usize,
    },
    /// Short definition of a medical term.
    TermExplanation,
}

/// A fully specified prompt for one provider call. Built fresh per call.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// Fixed instructions for the task.
    pub preamble: String,
    /// Document text, chunk content or term.
    pub payload: String,
    /// Label of the provider the prompt will be sent to.
    pub provider: &'static str,
    /// Task the prompt was built for.
    pub task: PromptTask,
}

impl PromptSpec {
    /// Whole-document patient summary.
    pub fn patient_summary(text: &str, provider: &'static str) -> Self {
        Self {
            preamble: format!(
                "{PATIENT_SUMMARY_PREAMBLE}\n5. Disclaimer: End with \"{SUMMARY_DISCLAIMER}\""
            ),
            payload: text.to_string(),
            provider,
            task: PromptTask::PatientSummary,
        }
    }

    /// Extraction prompt for one chunk of a longer document.
    pub fn chunk_extraction(
        content: &str,
        index: usize,
        total: usize,
        provider: &'static str,
    ) -> Self {
        Self {
            preamble: format!(
                "{CHUNK_EXTRACTION_PREAMBLE}\nIf this section contains no medical data, reply exactly: \"{NO_MEDICAL_DATA}\""
            ),
            payload: content.to_string(),
            provider,
            task: PromptTask::ChunkExtraction { index, total },
        }
    }

    /// Patient-friendly definition of `term`.
    pub fn term_explanation(term: &str, provider: &'static str) -> Self {
        Self {
            preamble: "Explain the medical term below in simple, patient-friendly language.\n\
Keep the explanation short (2-3 sentences).\n\
Do NOT provide diagnosis or medical advice.\n\
Just the definition."
                .to_string(),
            payload: term.trim().to_string(),
            provider,
            task: PromptTask::TermExplanation,
        }
    }

    /// Final prompt text sent to the provider.
    pub fn render(&self) -> String {
        match self.task {
            PromptTask::PatientSummary => format!(
                "{}\n\nDOCUMENT TEXT:\n{}\n\nPATIENT SUMMARY:",
                self.preamble, self.payload
            ),
            PromptTask::ChunkExtraction { index, total } => format!(
                "{}\n\nDOCUMENT SECTION {} OF {}:\n{}\n\nEXTRACTED DATA:",
                self.preamble,
                index + 1,
                total,
                self.payload
            ),
            PromptTask::TermExplanation => {
                format!("{}\n\nTERM: \"{}\"", self.preamble, self.payload)
            }
        }
    }
}
