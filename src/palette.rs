// Built-in emoji and sticker sets offered by the composer

pub const EMOJIS: &[&str] = &[
    "😀", "😃", "😄", "😁", "😆", "😅", "😂", "🤣", "☺️", "😊", "😇", "🙂", "😉", "😍", "🥰", "😘",
    "😜", "😎", "🤩", "🥳", "😏", "😢", "😭", "😤", "😠", "🤬", "🤯", "😱", "🥶", "🥱", "😴", "🤡",
    "💩", "👻", "💀", "👽", "👾", "🤖", "😺",
];

pub const STICKERS: &[&str] = &[
    "https://img.icons8.com/fluency/96/cat.png",
    "https://img.icons8.com/fluency/96/doge.png",
    "https://img.icons8.com/fluency/96/fire-element.png",
    "https://img.icons8.com/fluency/96/clown.png",
];

pub fn emoji(index: usize) -> Option<&'static str> {
    EMOJIS.get(index).copied()
}

pub fn sticker(index: usize) -> Option<&'static str> {
    STICKERS.get(index).copied()
}
