//! Document locations. Everything a user owns lives under `users/{uid}`.

use societas_store::{CollectionPath, DocumentPath};

pub fn users() -> CollectionPath {
    CollectionPath::root("users")
}

pub fn user(uid: &str) -> DocumentPath {
    users().doc(uid)
}

pub fn agents(uid: &str) -> CollectionPath {
    user(uid).collection("agents")
}

pub fn agent(uid: &str, agent_id: &str) -> DocumentPath {
    agents(uid).doc(agent_id)
}

pub fn subagents(uid: &str, agent_id: &str) -> CollectionPath {
    agent(uid, agent_id).collection("subagents")
}

pub fn boards(uid: &str) -> CollectionPath {
    user(uid).collection("boards")
}

pub fn board(uid: &str, board_id: &str) -> DocumentPath {
    boards(uid).doc(board_id)
}

pub fn tasks(uid: &str, board_id: &str) -> CollectionPath {
    board(uid, board_id).collection("tasks")
}

pub fn chats(uid: &str) -> CollectionPath {
    user(uid).collection("chats")
}

pub fn chat(uid: &str, chat_id: &str) -> DocumentPath {
    chats(uid).doc(chat_id)
}

pub fn messages(uid: &str, chat_id: &str) -> CollectionPath {
    chat(uid, chat_id).collection("messages")
}
