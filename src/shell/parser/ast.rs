use std::fmt;

use super::lexer::RedirectOp;

/// Where a stage sends its standard output. A stage holds at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRedirect {
    Truncate(String),
    Append(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirects {
    input: Option<String>,
    output: Option<OutputRedirect>,
}

impl Redirects {
    pub fn set(&mut self, operator: RedirectOp, target: String) {
        match operator {
            RedirectOp::Input => self.input = Some(target),
            RedirectOp::Output => self.output = Some(OutputRedirect::Truncate(target)),
            RedirectOp::Append => self.output = Some(OutputRedirect::Append(target)),
        }
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn truncate(&self) -> Option<&str> {
        match &self.output {
            Some(OutputRedirect::Truncate(path)) => Some(path),
            _ => None,
        }
    }

    pub fn append(&self) -> Option<&str> {
        match &self.output {
            Some(OutputRedirect::Append(path)) => Some(path),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<&OutputRedirect> {
        self.output.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }
}

/// One pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub arguments: Vec<String>,
    pub redirects: Redirects,
}

impl Stage {
    /// Argument vector handed to the program image, name first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))?;
        if let Some(path) = self.redirects.input() {
            write!(f, " <{}", path)?;
        }
        match self.redirects.output() {
            Some(OutputRedirect::Truncate(path)) => write!(f, " >{}", path),
            Some(OutputRedirect::Append(path)) => write!(f, " >>{}", path),
            None => Ok(()),
        }
    }
}

/// The stages parsed from one input line, in pipeline order.
///
/// Stage `i + 1` is the successor of stage `i`; the chain owns every stage and
/// is dropped as a whole once the line has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    stages: Vec<Stage>,
    pub background: bool,
    pub completion: bool,
}

impl CommandChain {
    /// A chain always holds at least one stage; an empty `stages` becomes one
    /// empty stage.
    pub fn new(mut stages: Vec<Stage>, background: bool, completion: bool) -> Self {
        if stages.is_empty() {
            stages.push(Stage::default());
        }
        Self {
            stages,
            background,
            completion,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn first(&self) -> &Stage {
        &self.stages[0]
    }

    pub fn last(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn last_mut(&mut self) -> &mut Stage {
        let last = self.stages.len() - 1;
        &mut self.stages[last]
    }

    pub fn successor(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index + 1)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }

    /// A blank line: nothing to run.
    pub fn is_noop(&self) -> bool {
        self.stages.len() == 1 && self.stages[0].name.is_empty()
    }
}

impl fmt::Display for CommandChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<String> = self.stages.iter().map(Stage::to_string).collect();
        write!(f, "{}", stages.join(" | "))?;
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}
