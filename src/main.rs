fn main() {
    routine_player_lib::run()
}
