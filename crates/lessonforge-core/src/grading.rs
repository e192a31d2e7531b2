//! Answer checking for quiz questions.

use crate::chemistry::parse_equation;
use crate::content::{DEFAULT_TOLERANCE, QuestionOption, QuestionType, QuizQuestion};

const TRUE_VALUES: [&str; 5] = ["true", "t", "yes", "y", "1"];

/// A learner's response: free text, or a list of selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }

    pub fn indices(values: &[usize]) -> Self {
        Answer::List(values.iter().map(|value| value.to_string()).collect())
    }

    fn is_blank(&self) -> bool {
        match self {
            Answer::Text(value) => value.trim().is_empty(),
            Answer::List(values) => values.iter().all(|value| value.trim().is_empty()),
        }
    }

    /// Items of a list answer, or the comma separated parts of a text answer.
    fn items(&self) -> Vec<String> {
        match self {
            Answer::Text(value) => value.split(',').map(|part| part.trim().to_string()).collect(),
            Answer::List(values) => values.iter().map(|value| value.trim().to_string()).collect(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Answer::Text(value) => value.clone(),
            Answer::List(values) => values.join(","),
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl QuizQuestion {
    /// Check a learner answer against this question.
    pub fn is_correct(&self, answer: &Answer) -> bool {
        if answer.is_blank() {
            return false;
        }

        match self.question_type {
            QuestionType::Mcq => self.mcq_correct(answer),
            QuestionType::FillBlank => self.fill_blank_correct(&answer.as_text()),
            QuestionType::Command => self.command_correct(&answer.as_text()),
            QuestionType::TrueFalse => self.true_false_correct(&answer.as_text()),
            QuestionType::Numerical => self.numerical_correct(&answer.as_text()),
            QuestionType::EquationBalance => self.equation_correct(&answer.as_text()),
            QuestionType::Sequence => self.sequence_correct(answer),
        }
    }

    /// First option flagged correct, for MCQ questions.
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        if self.question_type != QuestionType::Mcq {
            return None;
        }
        self.options.iter().find(|option| option.correct)
    }

    /// Human readable expected answer.
    pub fn formatted_correct_answer(&self) -> Option<String> {
        match self.question_type {
            QuestionType::Mcq if self.multiple_correct => Some(
                self.options
                    .iter()
                    .filter(|option| option.correct)
                    .map(|option| option.text.clone())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            QuestionType::Mcq => self.correct_option().map(|option| option.text.clone()),
            QuestionType::TrueFalse => self.correct_answer.as_deref().map(|value| {
                if is_truthy(value) {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }),
            _ => self.correct_answer.clone(),
        }
    }

    fn mcq_correct(&self, answer: &Answer) -> bool {
        if self.options.is_empty() {
            return false;
        }

        if self.multiple_correct {
            let mut selected: Vec<usize> = answer
                .items()
                .iter()
                .filter_map(|item| self.option_index(item))
                .collect();
            selected.sort_unstable();

            let expected: Vec<usize> = self
                .options
                .iter()
                .enumerate()
                .filter(|(_, option)| option.correct)
                .map(|(idx, _)| idx)
                .collect();

            return selected == expected;
        }

        let Some(expected) = self.options.iter().position(|option| option.correct) else {
            return false;
        };
        let text = answer.as_text();
        let text = text.trim();
        text.to_lowercase() == self.options[expected].text.trim().to_lowercase()
            || text.parse::<usize>().ok() == Some(expected)
    }

    /// Resolve an index or option text to an option position.
    fn option_index(&self, item: &str) -> Option<usize> {
        if let Ok(index) = item.parse::<usize>() {
            return Some(index);
        }
        let needle = item.trim().to_lowercase();
        self.options
            .iter()
            .position(|option| option.text.trim().to_lowercase() == needle)
    }

    fn fill_blank_correct(&self, answer: &str) -> bool {
        let user = answer.trim().to_lowercase();
        let expected = self.expected().trim().to_lowercase();
        user == expected || expected.split('|').any(|alt| alt.trim() == user)
    }

    fn command_correct(&self, answer: &str) -> bool {
        let user = normalize_command(answer);
        let expected = self.expected();
        user == normalize_command(expected)
            || expected.split('|').any(|alt| normalize_command(alt) == user)
    }

    fn true_false_correct(&self, answer: &str) -> bool {
        is_truthy(answer) == is_truthy(self.expected())
    }

    fn numerical_correct(&self, answer: &str) -> bool {
        let (Ok(user), Ok(expected)) = (
            answer.trim().parse::<f64>(),
            self.expected().trim().parse::<f64>(),
        ) else {
            return false;
        };
        let tolerance = self.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        (user - expected).abs() <= tolerance
    }

    fn equation_correct(&self, answer: &str) -> bool {
        match (parse_equation(answer), parse_equation(self.expected())) {
            (Ok(user), Ok(expected)) => user.same_terms(&expected),
            _ => false,
        }
    }

    fn sequence_correct(&self, answer: &Answer) -> bool {
        let expected: Vec<String> = self
            .expected()
            .split(',')
            .map(|part| part.trim().to_string())
            .collect();
        answer.items() == expected
    }

    fn expected(&self) -> &str {
        self.correct_answer.as_deref().unwrap_or_default()
    }
}

fn is_truthy(value: &str) -> bool {
    TRUE_VALUES.contains(&value.trim().to_lowercase().as_str())
}

fn normalize_command(command: &str) -> String {
    command
        .trim()
        .to_lowercase()
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::QuestionOption;

    fn numerical(answer: &str, tolerance: Option<f64>) -> QuizQuestion {
        let mut question = QuizQuestion::new("What is the molar mass of H2SO4?", QuestionType::Numerical);
        question.correct_answer = Some(answer.to_string());
        question.tolerance = tolerance;
        question
    }

    fn transition_metals() -> QuizQuestion {
        let mut question = QuizQuestion::new(
            "Which of the following are transition metals?",
            QuestionType::Mcq,
        );
        question.multiple_correct = true;
        question.options = vec![
            QuestionOption::new("Iron (Fe)", true),
            QuestionOption::new("Sodium (Na)", false),
            QuestionOption::new("Copper (Cu)", true),
            QuestionOption::new("Calcium (Ca)", false),
        ];
        question
    }

    #[test]
    fn numerical_accepts_within_tolerance() {
        let question = numerical("98.08", Some(0.1));
        assert!(question.is_correct(&"98.0".into()));
        assert!(question.is_correct(&"98.08".into()));
        assert!(question.is_correct(&"98.15".into()));
        assert!(!question.is_correct(&"97.5".into()));
        assert!(!question.is_correct(&"100.0".into()));
        assert!(!question.is_correct(&"abc".into()));
        assert!(!question.is_correct(&"".into()));
    }

    #[test]
    fn numerical_uses_default_tolerance() {
        let question = numerical("5.0", None);
        assert!(question.is_correct(&"5.01".into()));
        assert!(!question.is_correct(&"5.02".into()));
    }

    #[test]
    fn multiple_correct_ignores_selection_order() {
        let question = transition_metals();
        assert!(question.is_correct(&Answer::indices(&[0, 2])));
        assert!(question.is_correct(&Answer::indices(&[2, 0])));
        assert!(question.is_correct(&"0, 2".into()));
        assert!(question.is_correct(&Answer::List(vec![
            "iron (fe)".to_string(),
            "Copper (Cu)".to_string()
        ])));
        assert!(!question.is_correct(&Answer::indices(&[0])));
        assert!(!question.is_correct(&Answer::indices(&[0, 1, 2])));
    }

    #[test]
    fn single_mcq_accepts_text_or_index() {
        let mut question = QuizQuestion::new("Is f continuous at 0?", QuestionType::Mcq);
        question.options = vec![
            QuestionOption::new("Continuous", false),
            QuestionOption::new("Not continuous", true),
        ];
        assert!(question.is_correct(&"not continuous".into()));
        assert!(question.is_correct(&"1".into()));
        assert!(!question.is_correct(&"0".into()));
        assert!(!question.is_correct(&"Continuous".into()));
        assert_eq!(question.formatted_correct_answer().as_deref(), Some("Not continuous"));
    }

    #[test]
    fn fill_blank_and_command_accept_alternatives() {
        let mut fill = QuizQuestion::new("The SI unit of amount is the ___", QuestionType::FillBlank);
        fill.correct_answer = Some("mole | mol".to_string());
        assert!(fill.is_correct(&" MOL ".into()));
        assert!(!fill.is_correct(&"gram".into()));

        let mut command = QuizQuestion::new("List pods", QuestionType::Command);
        command.correct_answer = Some("kubectl get pods|kubectl get po".to_string());
        assert!(command.is_correct(&"kubectl   get  PODS".into()));
        assert!(command.is_correct(&"kubectl get po".into()));
        assert!(!command.is_correct(&"kubectl get svc".into()));
    }

    #[test]
    fn true_false_understands_synonyms() {
        let mut question = QuizQuestion::new("Water is polar", QuestionType::TrueFalse);
        question.correct_answer = Some("true".to_string());
        assert!(question.is_correct(&"Yes".into()));
        assert!(question.is_correct(&"1".into()));
        assert!(!question.is_correct(&"no".into()));
        assert_eq!(question.formatted_correct_answer().as_deref(), Some("True"));
    }

    #[test]
    fn sequence_and_equation_answers() {
        let mut sequence = QuizQuestion::new("Order the steps", QuestionType::Sequence);
        sequence.correct_answer = Some("1,3,2,4".to_string());
        assert!(sequence.is_correct(&"1, 3, 2, 4".into()));
        assert!(!sequence.is_correct(&"1,2,3,4".into()));

        let mut equation = QuizQuestion::new("Balance H2 + O2", QuestionType::EquationBalance);
        equation.correct_answer = Some("2H₂ + O₂ → 2H₂O".to_string());
        assert!(equation.is_correct(&"O2 + 2H2 -> 2H2O".into()));
        assert!(!equation.is_correct(&"H2 + O2 -> H2O".into()));
    }
}
