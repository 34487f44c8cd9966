//! Per-mode instructions and the single-shot prompt sent for every turn.

use mind_core::Mode;

/// Fixed instruction for each conversational stance.
pub fn instruction_for(mode: Mode) -> &'static str {
    match mode {
        Mode::EmpatheticListening => {
            "Solo valida emociones. Di 'te entiendo', 'es válido'. NO des consejos. Haz una pregunta suave."
        }
        Mode::PracticalAdvice => {
            "Sé un coach proactivo. Da 2 pasos prácticos o soluciones concretas. Sé breve."
        }
    }
}

/// Prompt for one stateless generation call. No prior turns are included.
pub fn build_prompt(mode: Mode, user_text: &str) -> String {
    format!(
        "Actúa como psicólogo. {}. Usuario: '{}'. Respuesta muy breve.",
        instruction_for(mode),
        user_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empathetic_instruction_forbids_advice() {
        let instr = instruction_for(Mode::EmpatheticListening);
        assert!(instr.contains("NO des consejos"));
        assert!(instr.starts_with("Solo valida emociones"));
    }

    #[test]
    fn test_advice_instruction_asks_for_steps() {
        let instr = instruction_for(Mode::PracticalAdvice);
        assert!(instr.contains("2 pasos prácticos"));
    }

    #[test]
    fn test_build_prompt_embeds_text_and_instruction() {
        let prompt = build_prompt(Mode::PracticalAdvice, "tuve un mal día");
        assert!(prompt.starts_with("Actúa como psicólogo. Sé un coach proactivo."));
        assert!(prompt.contains("Usuario: 'tuve un mal día'"));
        assert!(prompt.ends_with("Respuesta muy breve."));
    }
}
