//! Prompt builder: the admissions-assistant template filled with references.

use minijinja::{Environment, context};

/// Admissions-assistant prompt (Vietnamese).
///
/// `context` receives the reference answers, `query` the user's question.
/// When the references are unrelated the model is told to open with
/// "Dựa vào kiến thức của tôi, ..." ("Based on my own knowledge, ...").
pub const PROMPT_TEMPLATE: &str = r#"Bạn là trợ lí có kiến thức đầy đủ về vấn đề tuyển sinh trường Đại học Khoa học Tự nhiên
Dựa vào các tài liệu sau: {{ context }}
Trả lời đầy đủ, chính xác cho tôi câu hỏi: {{ query }}
Nếu trong các tài liệu không có thông tin nào liên quan đến câu hỏi của tôi, hãy trả lời "Dựa vào kiến thức của tôi, ..."
Output:"#;

/// Fills [`PROMPT_TEMPLATE`].
///
/// Every reference and the query appear verbatim in the output; several
/// references are separated by a blank line.
///
/// # Example
/// ```
/// # use contextor::build_prompt;
/// let p = build_prompt(&["March 31."], "When is the deadline?").unwrap();
/// assert!(p.contains("March 31."));
/// assert!(p.contains("When is the deadline?"));
/// ```
pub fn build_prompt(references: &[&str], query: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("prompt.txt", PROMPT_TEMPLATE)?;
    env.get_template("prompt.txt")?.render(context! {
        context => references.join("\n\n"),
        query => query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_reference_and_query_verbatim() {
        let p = build_prompt(&["Ngày 31/3 <hết hạn> & \"nộp\""], "Hạn nộp hồ sơ?").unwrap();
        assert!(p.contains("Ngày 31/3 <hết hạn> & \"nộp\""));
        assert!(p.contains("Hạn nộp hồ sơ?"));
        assert!(p.contains("Dựa vào kiến thức của tôi, ..."));
        assert!(p.ends_with("Output:"));
    }

    #[test]
    fn template_syntax_in_input_is_not_evaluated() {
        let p = build_prompt(&["{{ query }}"], "{% if x %}").unwrap();
        assert!(p.contains("Dựa vào các tài liệu sau: {{ query }}"));
        assert!(p.contains("câu hỏi: {% if x %}"));
    }

    #[test]
    fn several_references_are_all_present() {
        let p = build_prompt(&["A1", "A2"], "q").unwrap();
        assert!(p.contains("A1\n\nA2"));
    }
}
