mod alert;
mod base;
mod run;
mod sync;
