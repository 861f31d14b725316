fn main() {
    ipl::cli::run();
}
