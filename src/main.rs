fn main() {
    heartmatch::logging::init();
    heartmatch::ui::app::run();
}
