//! Prompt Templates
//!
//! Fixed wording sent to the model by the orchestrator and the decision
//! tools. Everything model-facing lives here so the tools stay mechanical.

use crate::model::{NEED_FURTHER_TEST, NO_FURTHER_TEST, PatientId};

/// System prompt for the clinical orchestrator
pub const CLINICAL_SYSTEM_PROMPT: &str = r#"You are a clinical workflow assistant bound to a single patient.

You work only through the tools listed below. Each tool result is appended to
the conversation; read it before deciding the next step. Do not invent tool
names or patient data. Keep replies short.

When calling a tool without native function calling, answer with a JSON block:
```tool
{"tool": "tool_name", "arguments": {"arg": "value"}}
```"#;

/// One entry of the orderable test menu
#[derive(Clone, Copy, Debug)]
pub struct MenuTest {
    pub category: &'static str,
    pub name: &'static str,
    pub purpose: &'static str,
}

const fn t(category: &'static str, name: &'static str, purpose: &'static str) -> MenuTest {
    MenuTest {
        category,
        name,
        purpose,
    }
}

/// The closed menu `recommend_test` chooses from
pub const TEST_MENU: [MenuTest; 30] = [
    t("CARDIAC/VASCULAR", "Troponin", "Cardiac injury marker"),
    t("CARDIAC/VASCULAR", "CK-MB", "Myocardial damage enzyme"),
    t("CARDIAC/VASCULAR", "BNP/NT-proBNP", "Heart failure marker"),
    t("CARDIAC/VASCULAR", "D-dimer", "Thromboembolism screening"),
    t("HEMATOLOGY/COAGULATION", "Complete Blood Count (CBC)", "Cell counts and morphology"),
    t("HEMATOLOGY/COAGULATION", "PT/INR", "Coagulation function"),
    t("HEMATOLOGY/COAGULATION", "PTT", "Intrinsic coagulation pathway"),
    t("HEMATOLOGY/COAGULATION", "Fibrinogen", "Clotting protein level"),
    t("CHEMISTRY/METABOLIC", "Basic Metabolic Panel (BMP)", "Electrolytes, kidney function"),
    t("CHEMISTRY/METABOLIC", "Comprehensive Metabolic Panel (CMP)", "Extended chemistry panel"),
    t("CHEMISTRY/METABOLIC", "Lactate", "Tissue hypoperfusion or metabolic stress"),
    t("CHEMISTRY/METABOLIC", "Arterial Blood Gas (ABG)", "Acid-base and oxygenation status"),
    t("CHEMISTRY/METABOLIC", "Venous Blood Gas (VBG)", "Venous pH and CO2"),
    t("CHEMISTRY/METABOLIC", "Glucose", "Blood sugar level"),
    t("CHEMISTRY/METABOLIC", "HbA1c", "Long-term glucose control"),
    t("LIVER/PANCREAS", "Liver Function Tests (LFT)", "Hepatic enzyme panel"),
    t("LIVER/PANCREAS", "Lipase", "Pancreatic enzyme"),
    t("LIVER/PANCREAS", "Amylase", "Pancreatic and salivary enzyme"),
    t("INFECTIOUS DISEASE", "Blood cultures", "Bacteremia detection"),
    t("INFECTIOUS DISEASE", "Respiratory PCR panel", "Viral pathogens such as COVID-19, Influenza, RSV"),
    t("INFECTIOUS DISEASE", "Procalcitonin", "Bacterial infection marker"),
    t("INFECTIOUS DISEASE", "C-reactive protein (CRP)", "Inflammation marker"),
    t("INFECTIOUS DISEASE", "Erythrocyte Sedimentation Rate (ESR)", "Systemic inflammation"),
    t("ENDOCRINE", "Thyroid Function Tests (TFT)", "TSH, T3, T4"),
    t("ENDOCRINE", "Cortisol", "Adrenal function"),
    t("RENAL/URINARY", "Urinalysis", "Urine composition and microscopy"),
    t("RENAL/URINARY", "Creatinine", "Kidney function marker"),
    t("TOXICOLOGY", "Urine drug screen", "Substance detection"),
    t("TOXICOLOGY", "Ethanol level", "Alcohol concentration"),
    t("TOXICOLOGY", "Salicylate level", "Aspirin toxicity screening"),
];

/// Task message that opens every run
pub fn patient_preamble(patient_id: &PatientId) -> String {
    format!(
        r"Patient id: {patient_id}

You act for this patient only and use the id above whenever a tool asks for
`patient_id`. Review the patient's history, decide on next steps and close the
loop with the patient.

Tools:
a) fetch_history: the patient's recorded test results.
b) diagnose: key findings and a confidence-gated impression from a summary of
   the history you write yourself. Returns {NEED_FURTHER_TEST} when unsure.
c) recommend_test: given your evaluation, either {NO_FURTHER_TEST} or one test
   from the menu.
d) order_test: orders one test for the patient. Every order must be followed
   by notify_patient telling the patient what was ordered and what happens next.
e) notify_patient: sends a message to the patient.
f) report_diagnosis: records your final diagnosis for clinical staff.

If a test is needed, order it first and then notify the patient about it.
Otherwise finish by notifying the patient of your findings, including when
everything looks normal."
    )
}

/// First `diagnose` prompt: findings plus a confidence integer
pub fn diagnosis_prompt(vitals: &str) -> String {
    format!(
        r"Patient data: {vitals}

You are a clinical decision-support assistant. Use only the patient data above.
1. Briefly explain the key findings and what the values indicate. If a
   condition is evident and you are certain of it, name it as your impression.
2. Rate your confidence in that impression from 1 (not sure at all) to 5
   (completely sure).
Answer with the key findings, the impression and the confidence integer."
    )
}

/// Second `diagnose` prompt, sent only when confidence met the threshold
pub fn impression_prompt(vitals: &str) -> String {
    format!(
        r"Patient data: {vitals}

State a concise clinical impression in one sentence."
    )
}

/// `recommend_test` prompt listing the full menu
pub fn test_menu_prompt(evaluation: &str) -> String {
    let mut prompt = format!(
        "You are a clinical decision-support agent. From the patient evaluation below, \
         decide whether an additional diagnostic test is warranted.\n\n\
         PATIENT EVALUATION:\n{evaluation}\n"
    );

    let mut category = "";
    for (i, test) in TEST_MENU.iter().enumerate() {
        if test.category != category {
            category = test.category;
            prompt.push_str(&format!("\n{category}:\n"));
        }
        prompt.push_str(&format!("{}. {} - {}\n", i + 1, test.name, test.purpose));
    }

    prompt.push_str(&format!(
        "\nDECISION CRITERIA:\n\
         - Clear clinical picture with an evident diagnosis: no test needed\n\
         - A differential that needs confirmation: recommend the confirming test\n\
         - A critical condition that must be ruled out: recommend the screening test\n\n\
         OUTPUT FORMAT:\n\
         - No test needed: \"{NO_FURTHER_TEST}\"\n\
         - Test needed: \"<test_name>\"\n\
         - Recommend at most one test and output nothing else\n\n\
         Your recommendation:"
    ));
    prompt
}
