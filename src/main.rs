pub mod cli;
pub mod codegen;
pub mod ident;
pub mod inference;
pub mod ir;
pub mod load;
pub mod lower;
pub mod shape;

fn main() -> anyhow::Result<()> {
    cli::CommandLineInterface::load().run()
}
