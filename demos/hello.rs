#[macro_use]
extern crate colour;
use synclogic::*;
use tracing_subscriber::EnvFilter;

/// Counts clock cycles.
#[derive(Default)]
struct Counter {
    value: u8,
}
ports! {
    Counter {
        inputs {}
        outputs { CNT_OUT: 8 }
    }
}
impl Module for Counter {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        ctx.set_output(Self::CNT_OUT, self.value as Signal);
    }
    fn clock_falling(&mut self, _ctx: &ClockContext<'_, Self>) {
        self.value = self.value.wrapping_add(1);
    }
    fn reset(&mut self) {
        self.value = 0;
    }
}

/// Prints the character at PRN_INDEX_IN on every rising edge.
struct Printer {
    text: Vec<char>,
    index: usize,
}
ports! {
    Printer {
        inputs { PRN_INDEX_IN: 8 }
        outputs { PRN_DONE: 1, PRN_EXIT_CODE: 8 }
    }
}
impl Printer {
    fn new(text: String) -> Self {
        Self {
            text: text.chars().collect(),
            index: 0,
        }
    }
}
impl Module for Printer {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        let done = self.index + 1 >= self.text.len();
        ctx.set_output(Self::PRN_DONE, done as Signal);
        ctx.set_output(Self::PRN_EXIT_CODE, if done { 42 } else { 69 });
    }
    fn clock_rising(&mut self, ctx: &ClockContext<'_, Self>) {
        self.index = ctx.input(Self::PRN_INDEX_IN) as usize;
        if let Some(c) = self.text.get(self.index) {
            print!("{}", c);
        }
    }
    fn reset(&mut self) {
        self.index = 0;
    }
}

fn hello(who: &str) -> Result<u64> {
    let mut system = System::new();
    let counter = system.add_named_module("counter", Counter::default())?;
    let printer = system.add_named_module("printer", Printer::new(format!("Hello, {}!", who)))?;
    system.connect(printer, Printer::PRN_INDEX_IN, counter, Counter::CNT_OUT)?;
    system.connect_exit(printer, Printer::PRN_DONE)?;
    system.connect_exit_code(printer, Printer::PRN_EXIT_CODE)?;
    system.init()?;
    system.run(false)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let who = match std::env::args().nth(1) {
        Some(who) => who,
        None => {
            e_red_ln!("Insufficient arguments: hello [name]");
            std::process::exit(1);
        }
    };
    match hello(&who) {
        Ok(code) => {
            green_ln!("\nExited with exit code {}", code);
        }
        Err(e) => {
            e_red_ln!("\n{}", e);
            std::process::exit(1);
        }
    }
}
