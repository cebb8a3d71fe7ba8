pub mod local_folder_service;
mod staging;
pub mod webdav;
