mod helpers;
mod orders;
mod tasks;
