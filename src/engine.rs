use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::config::{EngineConfig, EofPolicy};
use crate::error::{Error, Result};
use crate::stack::LoopStack;
use crate::stream::{InstructionStream, ReaderStream, SliceStream};
use crate::tape::Tape;

const GREATER: u8 = b'>';
const LESS: u8 = b'<';
const PLUS: u8 = b'+';
const MINUS: u8 = b'-';
const DOT: u8 = b'.';
const COMMA: u8 = b',';
const LBRACKET: u8 = b'[';
const RBRACKET: u8 = b']';

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Bytes dispatched by the main loop, comments included. Bytes consumed
    /// while skipping a loop body are not counted.
    pub steps: u64,
    pub output_bytes: u64,
    /// Deepest loop nesting reached.
    pub max_depth: usize,
    /// Loop stack capacity at the end of the run.
    pub stack_capacity: usize,
}

/// Executes a program straight off its instruction stream.
///
/// There is no compiled form of the program. Entering a loop saves the stream
/// position just after its `[`; a `]` with a non-zero cell seeks back there,
/// and a `[` with a zero cell scans forward counting brackets until the
/// matching `]`.
pub struct Engine<S, R, W> {
    tape: Tape,
    stack: LoopStack,
    stream: S,
    input: R,
    output: W,
    eof: EofPolicy,
    max_steps: Option<u64>,
    stats: RunStats,
}

impl<S: InstructionStream, R: Read, W: Write> Engine<S, R, W> {
    /// Allocate a fresh tape and loop stack for one execution of `stream`.
    pub fn new(config: &EngineConfig, stream: S, input: R, output: W) -> Result<Self> {
        config.validate()?;
        let tape = Tape::new(config.tape_size, config.bounds)?;
        let stack = LoopStack::new(config.stack_capacity, config.stack_growth)?;
        Ok(Self {
            tape,
            stack,
            stream,
            input,
            output,
            eof: config.eof,
            max_steps: config.max_steps,
            stats: RunStats::default(),
        })
    }

    /// Run until the stream is exhausted.
    ///
    /// Output is flushed whether or not the run succeeds, so everything the
    /// program printed before a failure reaches the sink.
    #[instrument(skip_all, fields(tape = self.tape.len()))]
    pub fn run(&mut self) -> Result<RunStats> {
        debug!("execution started");
        let result = self.run_to_end();
        let flushed = self.output.flush();
        self.stats.stack_capacity = self.stack.capacity();
        result?;
        flushed?;
        debug!(
            steps = self.stats.steps,
            output_bytes = self.stats.output_bytes,
            max_depth = self.stats.max_depth,
            open_loops = self.stack.depth(),
            "execution finished"
        );
        Ok(self.stats)
    }

    fn run_to_end(&mut self) -> Result<()> {
        while self.step()? {}
        Ok(())
    }

    /// Read and dispatch one byte. Returns `false` once the stream has ended.
    pub fn step(&mut self) -> Result<bool> {
        let Some(byte) = self.stream.next_byte()? else {
            return Ok(false);
        };
        if let Some(limit) = self.max_steps.filter(|&limit| self.stats.steps >= limit) {
            return Err(Error::StepLimit(limit));
        }
        self.stats.steps += 1;

        match byte {
            GREATER => self.tape.move_by(1)?,
            LESS => self.tape.move_by(-1)?,
            PLUS => self.tape.increment(),
            MINUS => self.tape.decrement(),
            DOT => {
                self.output.write_all(&[self.tape.read()])?;
                self.stats.output_bytes += 1;
            }
            COMMA => self.read_input()?,
            LBRACKET => {
                if self.tape.read() != 0 {
                    self.stack.push(self.stream.position())?;
                    self.stats.max_depth = self.stats.max_depth.max(self.stack.depth());
                } else {
                    self.skip_loop()?;
                }
            }
            RBRACKET => {
                // The `]` itself sits one byte before the current position.
                let offset = self.stream.position().offset() - 1;
                if self.tape.read() != 0 {
                    let body = self.stack.peek().ok_or(Error::Unbalanced { offset })?;
                    self.stream.seek(body)?;
                } else {
                    self.stack.pop().ok_or(Error::Unbalanced { offset })?;
                }
            }
            _ => {} // comment
        }
        Ok(true)
    }

    /// Consume bytes up to and including the `]` matching a `[` just read.
    /// Stops quietly at end of stream if there is no match.
    fn skip_loop(&mut self) -> Result<()> {
        let from = self.stream.position().offset();
        let mut depth = 1usize;
        while depth > 0 {
            match self.stream.next_byte()? {
                Some(LBRACKET) => depth += 1,
                Some(RBRACKET) => depth -= 1,
                Some(_) => {}
                None => break,
            }
        }
        trace!(from, to = self.stream.position().offset(), "loop skipped");
        Ok(())
    }

    fn read_input(&mut self) -> Result<()> {
        // Anything printed so far may be a prompt for this read.
        self.output.flush()?;
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => {
                    if let Some(sentinel) = self.eof.sentinel() {
                        self.tape.write(sentinel);
                    }
                    return Ok(());
                }
                Ok(_) => {
                    self.tape.write(buf[0]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn stack(&self) -> &LoopStack {
        &self.stack
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Run a program held in memory.
pub fn run_program<R: Read, W: Write>(
    source: &[u8],
    input: R,
    output: W,
    config: &EngineConfig,
) -> Result<RunStats> {
    Engine::new(config, SliceStream::new(source), input, output)?.run()
}

/// Run the program in the file at `path`, reading it incrementally.
pub fn run_file<R: Read, W: Write>(
    path: &Path,
    input: R,
    output: W,
    config: &EngineConfig,
) -> Result<RunStats> {
    let source_error = |source| Error::Source {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(source_error)?;
    let stream = ReaderStream::new(file).map_err(source_error)?;
    debug!(path = %path.display(), "source opened");
    Engine::new(config, stream, input, output)?.run()
}
