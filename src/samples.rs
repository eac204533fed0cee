/// Canned programs for trying the pipeline without writing a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Heaven,
    Evil,
    Broken,
}

impl Sample {
    pub fn all() -> Vec<Self> {
        vec![Self::Heaven, Self::Evil, Self::Broken]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|sample| sample.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Heaven => "heaven",
            Self::Evil => "evil",
            Self::Broken => "broken",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Heaven => "while loop laid out one statement per line, no end-of-program sign",
            Self::Evil => "the same loop with whitespace squeezed out, so words run together",
            Self::Broken => "like evil, with a doubled identifier in the declaration",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Heaven => {
                "/* test case for whilestatement\n Prints 23458 */\n{\n int a\n a = 1\n {\n while (a != 5) {\n a = 1 + a\n print(a)\n }\n print(3 + a)\n }\n}\n"
            }
            Self::Evil => {
                "/* test case for whilestatement\nPrints 23458 */{inta=1{while(a!=5)\n{a=1+aprint(a)}print(3+a)}}$\n"
            }
            Self::Broken => {
                "/* Test case for WhileStatement.\n    Prints 23458 */{intaa=1{while(a!=5)\n    {a=1+aprint(a)}print(3+a)}}$\n"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn finds_samples_by_name() {
        assert_eq!(Sample::from_name("EVIL"), Some(Sample::Evil));
        assert_eq!(Sample::from_name("nope"), None);
    }

    #[test]
    fn heaven_only_misses_its_end_of_program() {
        let compilation = compile(Sample::Heaven.source());
        let messages: Vec<&str> = compilation
            .stream
            .diagnostics()
            .map(|(_, diagnostic)| diagnostic.message.as_str())
            .collect();
        assert_eq!(messages, vec!["No end-of-program sign ('$') found"]);
        assert_eq!(compilation.syntax_errors.len(), 1);
    }

    #[test]
    fn run_together_words_scan_cleanly_but_do_not_parse() {
        for sample in [Sample::Evil, Sample::Broken] {
            let compilation = compile(sample.source());
            assert_eq!(compilation.stream.diagnostics().count(), 0);
            assert!(
                compilation
                    .syntax_errors
                    .iter()
                    .any(|error| error.message() == "Invalid Statement"),
                "{} should be rejected",
                sample.name()
            );
        }
    }
}
